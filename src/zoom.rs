//! Focus state machine for the interactive view.
//!
//! The controller owns the focused node, the last applied [`View`] and a label
//! state per node. A focus change starts a transition identified by a
//! [`TransitionToken`]; the host drives it by calling [`ZoomController::advance`]
//! once per animation frame. Starting another transition, or building a new
//! controller for a new render, makes older tokens stale.

use crate::config::ZoomConfig;
use crate::layout::{NodeId, PackedNode, PackedTree};
use serde::{Deserialize, Serialize};

const RHO: f64 = std::f64::consts::SQRT_2;
const RHO2: f64 = 2.0;
const RHO4: f64 = 4.0;
const EPSILON2: f64 = 1e-12;

/// Viewport center and diameter, in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct View {
    pub cx: f64,
    pub cy: f64,
    pub diameter: f64,
}

impl View {
    pub fn new(cx: f64, cy: f64, diameter: f64) -> Self {
        Self { cx, cy, diameter }
    }

    pub fn of_node(node: &PackedNode) -> Self {
        Self::new(node.x, node.y, node.r * 2.0)
    }

    /// Screen pixels per layout unit for a canvas `width` wide.
    pub fn scale(&self, width: f64) -> f64 {
        if self.diameter > 0.0 {
            width / self.diameter
        } else {
            1.0
        }
    }

    /// Position of a layout point relative to the canvas center.
    pub fn project(&self, x: f64, y: f64, width: f64) -> (f64, f64) {
        let k = self.scale(width);
        ((x - self.cx) * k, (y - self.cy) * k)
    }
}

#[derive(Debug, Clone, Copy)]
enum ZoomPath {
    Straight { s: f64 },
    Curved { d1: f64, r0: f64, s: f64 },
    Linear,
}

/// Smooth pan-and-zoom path between two views (van Wijk and Nuij), the same
/// curve d3's `interpolateZoom` follows.
#[derive(Debug, Clone, Copy)]
pub struct ZoomInterpolator {
    from: View,
    to: View,
    path: ZoomPath,
}

impl ZoomInterpolator {
    pub fn new(from: View, to: View) -> Self {
        let (ux0, uy0, w0) = (from.cx, from.cy, from.diameter);
        let (ux1, uy1, w1) = (to.cx, to.cy, to.diameter);
        let dx = ux1 - ux0;
        let dy = uy1 - uy0;
        let d2 = dx * dx + dy * dy;

        let path = if w0 <= 0.0 || w1 <= 0.0 {
            ZoomPath::Linear
        } else if d2 < EPSILON2 {
            ZoomPath::Straight {
                s: (w1 / w0).ln() / RHO,
            }
        } else {
            let d1 = d2.sqrt();
            let b0 = (w1 * w1 - w0 * w0 + RHO4 * d2) / (2.0 * w0 * RHO2 * d1);
            let b1 = (w1 * w1 - w0 * w0 - RHO4 * d2) / (2.0 * w1 * RHO2 * d1);
            let r0 = ((b0 * b0 + 1.0).sqrt() - b0).ln();
            let r1 = ((b1 * b1 + 1.0).sqrt() - b1).ln();
            ZoomPath::Curved {
                d1,
                r0,
                s: (r1 - r0) / RHO,
            }
        };
        Self { from, to, path }
    }

    pub fn at(&self, t: f64) -> View {
        if t <= 0.0 {
            return self.from;
        }
        if t >= 1.0 {
            return self.to;
        }
        let (ux0, uy0, w0) = (self.from.cx, self.from.cy, self.from.diameter);
        let dx = self.to.cx - ux0;
        let dy = self.to.cy - uy0;
        match self.path {
            ZoomPath::Straight { s } => {
                View::new(ux0 + t * dx, uy0 + t * dy, w0 * (RHO * t * s).exp())
            }
            ZoomPath::Curved { d1, r0, s } => {
                let s = t * s;
                let cosh_r0 = r0.cosh();
                let u = w0 / (RHO2 * d1) * (cosh_r0 * (RHO * s + r0).tanh() - r0.sinh());
                View::new(
                    ux0 + u * dx,
                    uy0 + u * dy,
                    w0 * cosh_r0 / (RHO * s + r0).cosh(),
                )
            }
            ZoomPath::Linear => View::new(
                ux0 + t * dx,
                uy0 + t * dy,
                w0 + t * (self.to.diameter - w0),
            ),
        }
    }
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelState {
    pub opacity: f64,
    pub displayed: bool,
}

impl LabelState {
    const SHOWN: Self = Self {
        opacity: 1.0,
        displayed: true,
    };
    const HIDDEN: Self = Self {
        opacity: 0.0,
        displayed: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionToken {
    pub generation: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTransition {
    pub token: TransitionToken,
    pub focus: NodeId,
    pub from: View,
    pub to: View,
    pub started_at: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub view: View,
    pub scale: f64,
    pub done: bool,
}

#[derive(Debug, Clone, Copy)]
struct LabelFade {
    node: NodeId,
    from: f64,
    to: f64,
}

#[derive(Debug, Clone)]
struct ActiveTransition {
    token: TransitionToken,
    started_at: f64,
    duration: f64,
    path: ZoomInterpolator,
    fades: Vec<LabelFade>,
}

#[derive(Debug, Clone)]
pub struct ZoomController {
    config: ZoomConfig,
    width: f64,
    generation: u64,
    sequence: u64,
    root: NodeId,
    focus: NodeId,
    view: View,
    parents: Vec<Option<NodeId>>,
    labels: Vec<LabelState>,
    active: Option<ActiveTransition>,
}

impl ZoomController {
    /// Focus on the root with only the root's children labelled.
    pub fn new(tree: &PackedTree, width: f64, generation: u64, config: ZoomConfig) -> Self {
        let root = tree.root_id();
        let parents: Vec<Option<NodeId>> = tree.nodes().iter().map(|node| node.parent).collect();
        let labels = parents
            .iter()
            .map(|parent| {
                if *parent == Some(root) {
                    LabelState::SHOWN
                } else {
                    LabelState::HIDDEN
                }
            })
            .collect();
        Self {
            config,
            width,
            generation,
            sequence: 0,
            root,
            focus: root,
            view: View::of_node(tree.root()),
            parents,
            labels,
            active: None,
        }
    }

    pub fn focus(&self) -> NodeId {
        self.focus
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn scale(&self) -> f64 {
        self.view.scale(self.width)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn label(&self, node: NodeId) -> LabelState {
        self.labels
            .get(node.0)
            .copied()
            .unwrap_or(LabelState::HIDDEN)
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Click on a circle. Clicking the current focus does nothing.
    pub fn focus_node(
        &mut self,
        tree: &PackedTree,
        target: NodeId,
        now: f64,
        slow: bool,
    ) -> Option<FocusTransition> {
        if target == self.focus {
            return None;
        }
        let node = tree.node(target)?;
        Some(self.start(target, View::of_node(node), now, slow))
    }

    /// Click on the canvas background.
    pub fn focus_root(&mut self, tree: &PackedTree, now: f64, slow: bool) -> Option<FocusTransition> {
        self.focus_node(tree, self.root, now, slow)
    }

    fn start(&mut self, target: NodeId, to: View, now: f64, slow: bool) -> FocusTransition {
        self.focus = target;
        self.sequence += 1;
        let token = TransitionToken {
            generation: self.generation,
            sequence: self.sequence,
        };
        let duration = if slow {
            self.config.slow_duration
        } else {
            self.config.duration
        };

        let mut fades = Vec::new();
        for (index, parent) in self.parents.iter().enumerate() {
            let entering = *parent == Some(target);
            let label = &mut self.labels[index];
            if !entering && !label.displayed {
                continue;
            }
            if entering {
                label.displayed = true;
            }
            fades.push(LabelFade {
                node: NodeId(index),
                from: label.opacity,
                to: if entering { 1.0 } else { 0.0 },
            });
        }

        let from = self.view;
        tracing::debug!(focus = target.0, duration, slow, "zoom transition started");
        self.active = Some(ActiveTransition {
            token,
            started_at: now,
            duration,
            path: ZoomInterpolator::new(from, to),
            fades,
        });
        FocusTransition {
            token,
            focus: target,
            from,
            to,
            started_at: now,
            duration,
        }
    }

    /// Applies the frame at time `now`. Returns `None` for a superseded token.
    pub fn advance(&mut self, token: TransitionToken, now: f64) -> Option<Frame> {
        let active = self.active.as_ref()?;
        if active.token != token || token.generation != self.generation {
            return None;
        }
        let t = if active.duration > 0.0 {
            ((now - active.started_at) / active.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = ease_cubic_in_out(t);
        let done = t >= 1.0;

        self.view = active.path.at(if done { 1.0 } else { eased });
        for fade in &active.fades {
            let label = &mut self.labels[fade.node.0];
            label.opacity = fade.from + (fade.to - fade.from) * eased;
            if done && fade.to == 0.0 {
                label.displayed = false;
            }
        }
        if done {
            self.active = None;
        }

        Some(Frame {
            view: self.view,
            scale: self.view.scale(self.width),
            done,
        })
    }

    /// Jumps straight to `target` with no animation, as if a transition had
    /// run to completion.
    pub fn jump_to(&mut self, tree: &PackedTree, target: NodeId) -> Option<Frame> {
        let transition = self.focus_node(tree, target, 0.0, false)?;
        self.advance(transition.token, transition.duration)
    }
}
