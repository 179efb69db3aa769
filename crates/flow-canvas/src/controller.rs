//! Pointer interaction state machine
//!
//! Exactly one gesture is active at a time:
//!
//! ```text
//!            press background          press node body         press output port
//!   Idle ─────────────────────► Panning   ──► DraggingNode(id)   ──► ConnectingFrom(id)
//!     ▲                            │                 │                      │
//!     └────────── release / pointer leaves canvas ───┴──────────────────────┘
//! ```
//!
//! Releasing a connection over another node's input port creates the edge.
//! Every event is handled to completion before the next one arrives, so
//! the controller needs no locking around the graph or viewport.

use flow_engine::validation::would_create_cycle;
use flow_engine::{EdgeId, EdgeOutcome, NodeId, Point, WorkflowGraph};
use serde::{Deserialize, Serialize};

use crate::geometry::Viewport;
use crate::input::{HitTarget, InputEvent, PointerButton, PointerEvent, WheelEvent};

/// Authoring rules applied when connecting nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Refuse connections that would close a cycle
    pub prevent_cycles: bool,
    /// Refuse edges out of sinks and into sources
    pub enforce_kind_direction: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            prevent_cycles: true,
            enforce_kind_direction: true,
        }
    }
}

/// The gesture currently in progress
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Gesture {
    #[default]
    Idle,
    /// Dragging the canvas; `last` is the previous pointer position
    Panning { last: Point },
    /// Dragging a node; `offset` is the world distance from the node's
    /// origin to the grab point
    #[serde(rename_all = "camelCase")]
    DraggingNode { node_id: NodeId, offset: Point },
    /// Drawing a connection out of a node
    #[serde(rename_all = "camelCase")]
    ConnectingFrom { node_id: NodeId },
}

/// Why a connection attempt created no edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionRefusal {
    SelfLoop,
    Duplicate,
    UnknownNode,
    OutOfSink,
    IntoSource,
    WouldCycle,
}

/// What handling an event changed
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    /// Nothing happened
    Ignored,
    PanStarted,
    Panned { pan: Point },
    DragStarted { node_id: NodeId },
    NodeMoved { node_id: NodeId, position: Point },
    ConnectStarted { node_id: NodeId },
    /// Temporary connection endpoint moved (world units)
    ConnectPreview { endpoint: Point },
    Connected { edge_id: EdgeId, from: NodeId, to: NodeId },
    ConnectionRefused { from: NodeId, to: NodeId, reason: ConnectionRefusal },
    /// A gesture finished without further effect
    GestureEnded,
    Zoomed { zoom: f64 },
}

/// Drives selection, dragging, panning, zooming and connection drawing
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    config: ControllerConfig,
    gesture: Gesture,
    selection: Option<NodeId>,
    /// End of the connection being drawn, in world units
    temp_endpoint: Option<Point>,
}

impl InteractionController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn temp_endpoint(&self) -> Option<Point> {
        self.temp_endpoint
    }

    /// Select a node (e.g. one just added from the palette)
    pub fn select(&mut self, node_id: impl Into<NodeId>) {
        self.selection = Some(node_id.into());
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Forget any state that refers to a node about to disappear
    pub fn node_deleted(&mut self, node_id: &str) {
        if self.selection.as_deref() == Some(node_id) {
            self.selection = None;
        }
        let involved = match &self.gesture {
            Gesture::DraggingNode { node_id: id, .. } | Gesture::ConnectingFrom { node_id: id } => {
                id == node_id
            }
            _ => false,
        };
        if involved {
            self.reset_gesture();
        }
    }

    /// Dispatch any input event
    pub fn handle(
        &mut self,
        event: &InputEvent,
        graph: &mut WorkflowGraph,
        viewport: &mut Viewport,
    ) -> InteractionOutcome {
        match event {
            InputEvent::PointerDown(e) => self.pointer_down(e, graph, viewport),
            InputEvent::PointerMove(e) => self.pointer_move(e, graph, viewport),
            InputEvent::PointerUp(e) => self.pointer_up(e, graph, viewport),
            InputEvent::PointerLeave => self.pointer_leave(),
            InputEvent::Wheel(e) => self.wheel(e, viewport),
        }
    }

    pub fn pointer_down(
        &mut self,
        event: &PointerEvent,
        graph: &WorkflowGraph,
        viewport: &Viewport,
    ) -> InteractionOutcome {
        if event.button != PointerButton::Primary || self.gesture != Gesture::Idle {
            return InteractionOutcome::Ignored;
        }

        match &event.target {
            HitTarget::Background => {
                self.selection = None;
                self.gesture = Gesture::Panning {
                    last: event.position,
                };
                InteractionOutcome::PanStarted
            }
            HitTarget::NodeBody(id) => {
                let Some(node) = graph.node(id) else {
                    return InteractionOutcome::Ignored;
                };
                let offset = viewport.screen_to_world(event.position) - node.position;
                self.selection = Some(id.clone());
                self.gesture = Gesture::DraggingNode {
                    node_id: id.clone(),
                    offset,
                };
                InteractionOutcome::DragStarted { node_id: id.clone() }
            }
            HitTarget::OutputPort(id) => {
                if !graph.contains_node(id) {
                    return InteractionOutcome::Ignored;
                }
                self.selection = Some(id.clone());
                self.gesture = Gesture::ConnectingFrom { node_id: id.clone() };
                self.temp_endpoint = Some(viewport.screen_to_world(event.position));
                InteractionOutcome::ConnectStarted { node_id: id.clone() }
            }
            HitTarget::InputPort(id) => {
                // Input ports only end connections; a press just selects.
                if !graph.contains_node(id) {
                    return InteractionOutcome::Ignored;
                }
                self.selection = Some(id.clone());
                InteractionOutcome::Ignored
            }
        }
    }

    pub fn pointer_move(
        &mut self,
        event: &PointerEvent,
        graph: &mut WorkflowGraph,
        viewport: &mut Viewport,
    ) -> InteractionOutcome {
        match &mut self.gesture {
            Gesture::Idle => InteractionOutcome::Ignored,
            Gesture::Panning { last } => {
                viewport.pan_by(event.position - *last);
                *last = event.position;
                InteractionOutcome::Panned { pan: viewport.pan() }
            }
            Gesture::DraggingNode { node_id, offset } => {
                let position = viewport.screen_to_world(event.position) - *offset;
                if !graph.set_position(node_id, position) {
                    return InteractionOutcome::Ignored;
                }
                InteractionOutcome::NodeMoved {
                    node_id: node_id.clone(),
                    position,
                }
            }
            Gesture::ConnectingFrom { .. } => {
                let endpoint = viewport.screen_to_world(event.position);
                self.temp_endpoint = Some(endpoint);
                InteractionOutcome::ConnectPreview { endpoint }
            }
        }
    }

    pub fn pointer_up(
        &mut self,
        event: &PointerEvent,
        graph: &mut WorkflowGraph,
        viewport: &mut Viewport,
    ) -> InteractionOutcome {
        let gesture = std::mem::take(&mut self.gesture);
        self.temp_endpoint = None;

        match gesture {
            Gesture::Idle => InteractionOutcome::Ignored,
            Gesture::Panning { .. } => InteractionOutcome::GestureEnded,
            Gesture::DraggingNode { node_id, offset } => {
                let position = viewport.screen_to_world(event.position) - offset;
                if graph.set_position(&node_id, position) {
                    InteractionOutcome::NodeMoved { node_id, position }
                } else {
                    InteractionOutcome::GestureEnded
                }
            }
            Gesture::ConnectingFrom { node_id: from } => match &event.target {
                HitTarget::InputPort(to) if *to != from => self.connect(graph, from, to.clone()),
                _ => InteractionOutcome::GestureEnded,
            },
        }
    }

    /// Pointer left the canvas: end whatever was going on, creating nothing
    pub fn pointer_leave(&mut self) -> InteractionOutcome {
        if self.gesture == Gesture::Idle {
            return InteractionOutcome::Ignored;
        }
        self.reset_gesture();
        InteractionOutcome::GestureEnded
    }

    pub fn wheel(&mut self, event: &WheelEvent, viewport: &mut Viewport) -> InteractionOutcome {
        let zoom = viewport.zoom_wheel(event.delta_y);
        InteractionOutcome::Zoomed { zoom }
    }

    fn reset_gesture(&mut self) {
        self.gesture = Gesture::Idle;
        self.temp_endpoint = None;
    }

    fn connect(&self, graph: &mut WorkflowGraph, from: NodeId, to: NodeId) -> InteractionOutcome {
        if let Some(reason) = self.check_connection(graph, &from, &to) {
            log::debug!("Refusing connection {} -> {}: {:?}", from, to, reason);
            return InteractionOutcome::ConnectionRefused { from, to, reason };
        }

        let reason = match graph.add_edge(&from, &to) {
            EdgeOutcome::Added(edge_id) => {
                return InteractionOutcome::Connected { edge_id, from, to };
            }
            EdgeOutcome::SelfLoop => ConnectionRefusal::SelfLoop,
            EdgeOutcome::Duplicate(_) => ConnectionRefusal::Duplicate,
            EdgeOutcome::UnknownNode(_) => ConnectionRefusal::UnknownNode,
        };
        InteractionOutcome::ConnectionRefused { from, to, reason }
    }

    fn check_connection(&self, graph: &WorkflowGraph, from: &str, to: &str) -> Option<ConnectionRefusal> {
        let (Some(source), Some(target)) = (graph.node(from), graph.node(to)) else {
            return Some(ConnectionRefusal::UnknownNode);
        };
        if self.config.enforce_kind_direction {
            if !source.kind.accepts_outgoing() {
                return Some(ConnectionRefusal::OutOfSink);
            }
            if !target.kind.accepts_incoming() {
                return Some(ConnectionRefusal::IntoSource);
            }
        }
        if self.config.prevent_cycles
            && graph.find_edge(from, to).is_none()
            && would_create_cycle(graph, from, to)
        {
            return Some(ConnectionRefusal::WouldCycle);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_engine::{NodeKind, WorkflowBuilder};

    fn setup() -> (InteractionController, WorkflowGraph, Viewport) {
        let graph = WorkflowBuilder::new("wf", "Canvas")
            .add_node("s", NodeKind::Source, "Study Notes", (100.0, 100.0))
            .add_node("t", NodeKind::Transform, "Extract Concepts", (400.0, 100.0))
            .add_node("o", NodeKind::Sink, "Flashcards", (700.0, 100.0))
            .build();
        (InteractionController::default(), graph, Viewport::default())
    }

    fn down(target: HitTarget, at: (f64, f64)) -> InputEvent {
        InputEvent::PointerDown(PointerEvent::primary(at, target))
    }

    fn moved(at: (f64, f64)) -> InputEvent {
        InputEvent::PointerMove(PointerEvent::primary(at, HitTarget::Background))
    }

    fn up(target: HitTarget, at: (f64, f64)) -> InputEvent {
        InputEvent::PointerUp(PointerEvent::primary(at, target))
    }

    #[test]
    fn test_background_press_pans_and_clears_selection() {
        let (mut ctl, mut graph, mut vp) = setup();
        ctl.select("s");

        let outcome = ctl.handle(&down(HitTarget::Background, (10.0, 10.0)), &mut graph, &mut vp);
        assert_eq!(outcome, InteractionOutcome::PanStarted);
        assert_eq!(ctl.selection(), None);

        ctl.handle(&moved((15.0, 12.0)), &mut graph, &mut vp);
        ctl.handle(&moved((25.0, 22.0)), &mut graph, &mut vp);
        assert_eq!(vp.pan(), Point::new(15.0, 12.0));

        let outcome = ctl.handle(&up(HitTarget::NodeBody("t".into()), (25.0, 22.0)), &mut graph, &mut vp);
        assert_eq!(outcome, InteractionOutcome::GestureEnded);
        assert_eq!(ctl.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let (mut ctl, mut graph, mut vp) = setup();

        // Grab 10px into the node; the node must not jump to the pointer.
        ctl.handle(&down(HitTarget::NodeBody("s".into()), (110.0, 110.0)), &mut graph, &mut vp);
        assert_eq!(ctl.selection(), Some("s"));
        ctl.handle(&moved((110.0, 110.0)), &mut graph, &mut vp);
        assert_eq!(graph.node("s").unwrap().position, Point::new(100.0, 100.0));

        ctl.handle(&moved((160.0, 90.0)), &mut graph, &mut vp);
        assert_eq!(graph.node("s").unwrap().position, Point::new(150.0, 80.0));

        ctl.handle(&up(HitTarget::Background, (170.0, 90.0)), &mut graph, &mut vp);
        assert_eq!(graph.node("s").unwrap().position, Point::new(160.0, 80.0));
        assert_eq!(ctl.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_drag_delta_scales_with_zoom() {
        let (mut ctl, mut graph, mut vp) = setup();
        vp.set_canvas_rect(Point::new(30.0, 40.0), Point::new(800.0, 600.0));
        vp.pan_by(Point::new(-50.0, 25.0));
        for _ in 0..10 {
            vp.zoom_in();
        }
        let zoom = vp.zoom();
        let start = graph.node("t").unwrap().position;

        let press = vp.world_to_screen(start + Point::new(5.0, 5.0));
        ctl.pointer_down(&PointerEvent::primary(press, HitTarget::NodeBody("t".into())), &graph, &vp);
        let (dx, dy) = (84.0, -36.0);
        ctl.handle(&moved((press.x + dx, press.y + dy)), &mut graph, &mut vp);

        let end = graph.node("t").unwrap().position;
        assert!((end.x - start.x - dx / zoom).abs() < 1e-9);
        assert!((end.y - start.y - dy / zoom).abs() < 1e-9);
    }

    #[test]
    fn test_connect_creates_edge_on_input_port() {
        let (mut ctl, mut graph, mut vp) = setup();

        let outcome = ctl.handle(&down(HitTarget::OutputPort("s".into()), (200.0, 120.0)), &mut graph, &mut vp);
        assert_eq!(outcome, InteractionOutcome::ConnectStarted { node_id: "s".into() });
        assert_eq!(ctl.temp_endpoint(), Some(Point::new(200.0, 120.0)));

        ctl.handle(&moved((300.0, 130.0)), &mut graph, &mut vp);
        assert_eq!(ctl.temp_endpoint(), Some(Point::new(300.0, 130.0)));
        assert!(graph.edges().is_empty());

        let outcome = ctl.handle(&up(HitTarget::InputPort("t".into()), (400.0, 120.0)), &mut graph, &mut vp);
        assert!(matches!(outcome, InteractionOutcome::Connected { ref from, ref to, .. } if from == "s" && to == "t"));
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(ctl.temp_endpoint(), None);
        assert_eq!(ctl.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_connect_released_elsewhere_creates_nothing() {
        let (mut ctl, mut graph, mut vp) = setup();

        for target in [
            HitTarget::Background,
            HitTarget::NodeBody("t".into()),
            HitTarget::InputPort("s".into()),
        ] {
            ctl.handle(&down(HitTarget::OutputPort("s".into()), (0.0, 0.0)), &mut graph, &mut vp);
            let outcome = ctl.handle(&up(target, (0.0, 0.0)), &mut graph, &mut vp);
            assert_eq!(outcome, InteractionOutcome::GestureEnded);
        }
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_connection_rules() {
        let (mut ctl, mut graph, mut vp) = setup();
        let mut attempt = |from: &str, to: &str, graph: &mut WorkflowGraph| {
            ctl.handle(&down(HitTarget::OutputPort(from.into()), (0.0, 0.0)), graph, &mut vp);
            ctl.handle(&up(HitTarget::InputPort(to.into()), (0.0, 0.0)), graph, &mut vp)
        };

        assert!(matches!(attempt("s", "t", &mut graph), InteractionOutcome::Connected { .. }));
        assert!(matches!(
            attempt("s", "t", &mut graph),
            InteractionOutcome::ConnectionRefused { reason: ConnectionRefusal::Duplicate, .. }
        ));
        assert!(matches!(
            attempt("o", "t", &mut graph),
            InteractionOutcome::ConnectionRefused { reason: ConnectionRefusal::OutOfSink, .. }
        ));
        assert!(matches!(
            attempt("t", "s", &mut graph),
            InteractionOutcome::ConnectionRefused { reason: ConnectionRefusal::IntoSource, .. }
        ));
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_cycle_prevention_can_be_disabled() {
        let mut graph = WorkflowBuilder::new("wf", "Loop")
            .add_node("a", NodeKind::Transform, "A", (0.0, 0.0))
            .add_node("b", NodeKind::Transform, "B", (0.0, 0.0))
            .connect("a", "b")
            .build();
        let mut vp = Viewport::default();

        let mut strict = InteractionController::default();
        strict.handle(&down(HitTarget::OutputPort("b".into()), (0.0, 0.0)), &mut graph, &mut vp);
        let outcome = strict.handle(&up(HitTarget::InputPort("a".into()), (0.0, 0.0)), &mut graph, &mut vp);
        assert!(matches!(
            outcome,
            InteractionOutcome::ConnectionRefused { reason: ConnectionRefusal::WouldCycle, .. }
        ));

        let mut loose = InteractionController::new(ControllerConfig {
            prevent_cycles: false,
            ..ControllerConfig::default()
        });
        loose.handle(&down(HitTarget::OutputPort("b".into()), (0.0, 0.0)), &mut graph, &mut vp);
        let outcome = loose.handle(&up(HitTarget::InputPort("a".into()), (0.0, 0.0)), &mut graph, &mut vp);
        assert!(matches!(outcome, InteractionOutcome::Connected { .. }));
    }

    #[test]
    fn test_pointer_leave_resets_any_gesture() {
        let (mut ctl, mut graph, mut vp) = setup();

        for target in [
            HitTarget::Background,
            HitTarget::NodeBody("s".into()),
            HitTarget::OutputPort("s".into()),
        ] {
            ctl.handle(&down(target, (0.0, 0.0)), &mut graph, &mut vp);
            assert_ne!(ctl.gesture(), &Gesture::Idle);
            assert_eq!(ctl.handle(&InputEvent::PointerLeave, &mut graph, &mut vp), InteractionOutcome::GestureEnded);
            assert_eq!(ctl.gesture(), &Gesture::Idle);
            assert_eq!(ctl.temp_endpoint(), None);
        }
        assert!(graph.edges().is_empty());
        assert_eq!(ctl.handle(&InputEvent::PointerLeave, &mut graph, &mut vp), InteractionOutcome::Ignored);
    }

    #[test]
    fn test_secondary_button_and_busy_presses_ignored() {
        let (mut ctl, mut graph, mut vp) = setup();

        let secondary = InputEvent::PointerDown(PointerEvent {
            position: Point::ORIGIN,
            button: PointerButton::Secondary,
            target: HitTarget::Background,
        });
        assert_eq!(ctl.handle(&secondary, &mut graph, &mut vp), InteractionOutcome::Ignored);

        ctl.handle(&down(HitTarget::NodeBody("s".into()), (0.0, 0.0)), &mut graph, &mut vp);
        let outcome = ctl.handle(&down(HitTarget::Background, (0.0, 0.0)), &mut graph, &mut vp);
        assert_eq!(outcome, InteractionOutcome::Ignored);
        assert!(matches!(ctl.gesture(), Gesture::DraggingNode { .. }));
    }

    #[test]
    fn test_wheel_zooms_within_bounds() {
        let (mut ctl, mut graph, mut vp) = setup();
        let wheel = |delta_y| {
            InputEvent::Wheel(WheelEvent {
                delta_y,
                position: Point::ORIGIN,
            })
        };
        for _ in 0..50 {
            ctl.handle(&wheel(-100.0), &mut graph, &mut vp);
        }
        assert_eq!(vp.zoom(), crate::geometry::defaults::ZOOM_MAX);
        for _ in 0..50 {
            ctl.handle(&wheel(100.0), &mut graph, &mut vp);
        }
        assert!((vp.zoom() - crate::geometry::defaults::ZOOM_MIN).abs() < 1e-9);
    }

    #[test]
    fn test_node_deleted_clears_selection_and_drag() {
        let (mut ctl, mut graph, mut vp) = setup();
        ctl.handle(&down(HitTarget::NodeBody("t".into()), (0.0, 0.0)), &mut graph, &mut vp);

        ctl.node_deleted("t");
        graph.delete_node("t");
        assert_eq!(ctl.selection(), None);
        assert_eq!(ctl.gesture(), &Gesture::Idle);
        assert_eq!(ctl.handle(&moved((5.0, 5.0)), &mut graph, &mut vp), InteractionOutcome::Ignored);
    }
}
