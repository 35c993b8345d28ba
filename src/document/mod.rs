//! Document assembly.
//!
//! Assembly is two steps: [`Assembler::layout`] maps a validated request onto
//! a flat list of [`Block`]s, and [`docx::package`] renders those blocks into
//! a complete OOXML package in memory. Layout is a pure function of the
//! request, which makes the structure easy to test without unzipping.

pub mod docx;

use crate::error::Result;
use crate::outline;
use crate::validation::DocumentRequest;

pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const DEFAULT_WORK_LABEL: &str = "ВЫПУСКНАЯ КВАЛИФИКАЦИОННАЯ РАБОТА";

pub const CONTENTS_HEADING: &str = "Содержание";
pub const GOALS_HEADING: &str = "Цель работы";
pub const TASKS_HEADING: &str = "Задачи исследования";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Block-level element of the assembled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Body paragraph with a single run. Empty text is a spacer line.
    Paragraph {
        text: String,
        align: Option<Align>,
        bold: bool,
    },
    Heading { level: u8, text: String },
    /// Item of an unordered list.
    Bullet { text: String },
    /// A hard page break.
    PageBreak,
}

impl Block {
    pub fn plain(text: impl Into<String>) -> Self {
        Block::Paragraph {
            text: text.into(),
            align: None,
            bold: false,
        }
    }

    pub fn spacer() -> Self {
        Self::plain("")
    }

    pub fn centered(text: impl Into<String>, bold: bool) -> Self {
        Block::Paragraph {
            text: text.into(),
            align: Some(Align::Center),
            bold,
        }
    }

    pub fn left(text: impl Into<String>) -> Self {
        Block::Paragraph {
            text: text.into(),
            align: Some(Align::Left),
            bold: false,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Paragraph { text, .. } | Block::Heading { text, .. } | Block::Bullet { text } => {
                Some(text.as_str())
            }
            Block::PageBreak => None,
        }
    }
}

/// Laid-out document, ready for packaging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// Shown as the package title in document properties.
    pub title: String,
    pub author: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn page_breaks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::PageBreak))
            .count()
    }

    /// Bullet texts directly following the heading with `heading` text.
    pub fn bullets_under(&self, heading: &str) -> Vec<&str> {
        self.blocks
            .iter()
            .skip_while(|b| !matches!(b, Block::Heading { text, .. } if text == heading))
            .skip(1)
            .take_while(|b| matches!(b, Block::Bullet { .. }))
            .filter_map(Block::text)
            .collect()
    }

    pub fn position_of(&self, wanted: &Block) -> Option<usize> {
        self.blocks.iter().position(|b| b == wanted)
    }
}

/// Maps validated requests onto documents.
#[derive(Debug, Clone)]
pub struct Assembler {
    work_label: String,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_LABEL)
    }
}

impl Assembler {
    pub fn new(work_label: impl Into<String>) -> Self {
        Self {
            work_label: work_label.into(),
        }
    }

    pub fn layout(&self, request: &DocumentRequest) -> Document {
        let title = &request.title;
        let mut blocks = vec![
            Block::centered(&title.university, true),
            Block::centered(&title.faculty, false),
            Block::centered(&title.department, false),
            Block::spacer(),
            Block::centered(&self.work_label, true),
            Block::centered(&title.work_title, true),
            Block::spacer(),
            Block::left(format!("Студент: {}", title.student_name)),
            Block::left(format!("Научный руководитель: {}", title.supervisor_name)),
            Block::spacer(),
            Block::centered(format!("{} — {} г.", title.city, title.year), false),
            Block::PageBreak,
            Block::Heading {
                level: 1,
                text: CONTENTS_HEADING.to_string(),
            },
        ];

        blocks.extend(outline::resolve(request.profile).iter().map(Block::plain));

        blocks.push(Block::spacer());
        blocks.push(Block::Heading {
            level: 2,
            text: GOALS_HEADING.to_string(),
        });
        blocks.extend(request.goals.iter().map(|g| Block::Bullet { text: g.clone() }));

        blocks.push(Block::Heading {
            level: 2,
            text: TASKS_HEADING.to_string(),
        });
        blocks.extend(request.tasks.iter().map(|t| Block::Bullet { text: t.clone() }));

        Document {
            title: title.work_title.clone(),
            author: title.student_name.clone(),
            blocks,
        }
    }

    /// Lay out and package a request. Either the whole DOCX or an error.
    pub fn assemble(&self, request: &DocumentRequest) -> Result<Vec<u8>> {
        let document = self.layout(request);
        let bytes = docx::package(&document)?;
        tracing::info!(
            profile = %request.profile,
            goals = request.goals.len(),
            tasks = request.tasks.len(),
            bytes = bytes.len(),
            "document assembled"
        );
        Ok(bytes)
    }
}
