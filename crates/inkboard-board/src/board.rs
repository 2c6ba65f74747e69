//! Board state machine
//!
//! One action mode at a time (idle, drawing, erasing, writing text) layered
//! over the element collection and its history. Transitions report which
//! kind of mutation, if any, should go out to peers.

use inkboard_core::{Element, MutationKind, Point, Shape, Stroke, TextBox};
use std::collections::HashMap;
use tracing::debug;

use crate::hit_test;
use crate::history::{History, HistoryPolicy};

/// Drawing tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Freehand stroke
    #[default]
    Brush,
    /// Straight line
    Line,
    /// Rectangle
    Rectangle,
    /// Ellipse
    Circle,
    /// Line with a head
    Arrow,
    /// Removes elements under the pointer
    Eraser,
    /// Text label
    Text,
}

/// Per-tool styling
#[derive(Debug, Clone, PartialEq)]
pub struct ToolStyle {
    /// Stroke (or text) color
    pub stroke: String,
    /// Fill color for closed shapes
    pub fill: Option<String>,
    /// Stroke width, or font size for text
    pub size: f64,
}

impl ToolStyle {
    fn for_tool(tool: Tool) -> Self {
        Self {
            stroke: "#000000".to_string(),
            fill: None,
            size: if tool == Tool::Text { 16.0 } else { 1.0 },
        }
    }
}

/// Current action mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Nothing in progress
    #[default]
    Idle,
    /// A shape or stroke is following the pointer
    Drawing,
    /// The eraser is down
    Erasing,
    /// A text label is waiting for its content
    WritingText,
}

/// Local board: tool, mode, elements and history
#[derive(Debug, Clone)]
pub struct BoardState {
    tool: Tool,
    styles: HashMap<Tool, ToolStyle>,
    mode: Mode,
    elements: Vec<Element>,
    history: History,
}

impl BoardState {
    /// Empty board with the given history policy
    #[must_use]
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            tool: Tool::default(),
            styles: HashMap::new(),
            mode: Mode::Idle,
            elements: Vec::new(),
            history: History::new(policy),
        }
    }

    /// Rendered elements
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Current mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Selected tool
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Undo/redo history
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Style a tool will draw with
    #[must_use]
    pub fn style(&self, tool: Tool) -> ToolStyle {
        self.styles
            .get(&tool)
            .cloned()
            .unwrap_or_else(|| ToolStyle::for_tool(tool))
    }

    /// Select the tool used by the next pointer-down
    pub fn select_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Set a tool's style
    pub fn set_style(&mut self, tool: Tool, style: ToolStyle) {
        self.styles.insert(tool, style);
    }

    fn new_element(&self, at: Point) -> Option<Element> {
        let style = self.style(self.tool);
        let shape = || Shape {
            start: at,
            end: at,
            stroke: style.stroke.clone(),
            fill: style.fill.clone(),
            size: style.size,
        };
        let element = match self.tool {
            Tool::Line => Element::Line(shape()),
            Tool::Rectangle => Element::Rectangle(shape()),
            Tool::Circle => Element::Circle(shape()),
            Tool::Arrow => Element::Arrow(shape()),
            Tool::Brush => Element::Brush(Stroke {
                points: vec![at],
                stroke: style.stroke.clone(),
            }),
            Tool::Text => Element::Text(TextBox {
                anchor: at,
                text: String::new(),
                stroke: style.stroke.clone(),
                font_size: style.size,
            }),
            Tool::Eraser => return None,
        };
        Some(element)
    }

    /// Pointer pressed. Returns whether the board changed.
    pub fn pointer_down(&mut self, at: Point) -> bool {
        if self.mode != Mode::Idle {
            return false;
        }

        self.mode = match self.tool {
            Tool::Eraser => Mode::Erasing,
            Tool::Text => Mode::WritingText,
            _ => Mode::Drawing,
        };
        if let Some(element) = self.new_element(at) {
            self.elements.push(element);
        }
        true
    }

    /// Pointer moved. Returns the kind of live update to send, if any.
    pub fn pointer_move(&mut self, at: Point) -> Option<MutationKind> {
        match self.mode {
            Mode::Drawing => {
                match self.elements.last_mut()? {
                    Element::Line(shape)
                    | Element::Rectangle(shape)
                    | Element::Circle(shape)
                    | Element::Arrow(shape) => shape.end = at,
                    Element::Brush(stroke) => stroke.points.push(at),
                    Element::Text(_) => return None,
                }
                Some(MutationKind::Draw)
            }
            Mode::Erasing => {
                let before = self.elements.len();
                self.elements
                    .retain(|element| !hit_test::is_near(element, at));
                (self.elements.len() != before).then_some(MutationKind::Erase)
            }
            Mode::Idle | Mode::WritingText => None,
        }
    }

    /// Pointer released. Commits and returns the kind of the committed edit.
    pub fn pointer_up(&mut self) -> Option<MutationKind> {
        let kind = match self.mode {
            Mode::Drawing => MutationKind::Draw,
            Mode::Erasing => MutationKind::Erase,
            Mode::Idle | Mode::WritingText => return None,
        };
        self.commit();
        Some(kind)
    }

    /// Text input lost focus. Returns whether a label was committed.
    pub fn finish_text(&mut self, text: &str) -> bool {
        if self.mode != Mode::WritingText {
            return false;
        }
        if let Some(Element::Text(label)) = self.elements.last_mut() {
            label.text = text.to_string();
        }
        self.commit();
        true
    }

    fn commit(&mut self) {
        self.history.push(self.elements.clone());
        self.mode = Mode::Idle;
        debug!(index = self.history.index(), elements = self.elements.len(), "Committed");
    }

    /// Step back in history. Ignored while an action is in progress.
    pub fn undo(&mut self) -> bool {
        if self.mode != Mode::Idle {
            return false;
        }
        match self.history.undo() {
            Some(snapshot) => {
                self.elements = snapshot.to_vec();
                true
            }
            None => false,
        }
    }

    /// Step forward in history. Ignored while an action is in progress.
    pub fn redo(&mut self) -> bool {
        if self.mode != Mode::Idle {
            return false;
        }
        match self.history.redo() {
            Some(snapshot) => {
                self.elements = snapshot.to_vec();
                true
            }
            None => false,
        }
    }

    /// Replace the elements with a remote snapshot and record it in history.
    ///
    /// An in-progress shape, stroke or label is discarded; the eraser stays
    /// down.
    pub fn sync(&mut self, elements: Vec<Element>) {
        if matches!(self.mode, Mode::Drawing | Mode::WritingText) {
            debug!(mode = ?self.mode, "Remote snapshot interrupted local edit");
            self.mode = Mode::Idle;
        }
        self.history.push(elements.clone());
        self.elements = elements;
    }

    /// Forget everything: empty elements, fresh history, idle
    pub fn reset(&mut self) {
        self.elements.clear();
        self.history = History::new(self.history.policy());
        self.mode = Mode::Idle;
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(HistoryPolicy::default())
    }
}
