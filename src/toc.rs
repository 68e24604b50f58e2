//! The chapter forest and the table of contents that owns it.
//!
//! A [`TableOfContents`] is replaced wholesale whenever a document is
//! regenerated. Chapter ids are only unique within one tree, so they must not
//! be carried across regenerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u32,
    pub title: String,
    pub level: u32,
    /// Character offset of the heading line.
    pub start_position: usize,
    /// Exclusive end offset; the next heading's start, or the text length.
    pub end_position: Option<usize>,
    pub page_number: Option<u32>,
    /// Number of characters in `[start_position, end_position)`.
    pub word_count: Option<usize>,
    pub children: Vec<Chapter>,
    pub confidence: f32,
}

impl Chapter {
    pub fn new(
        id: u32,
        title: impl Into<String>,
        level: u32,
        start_position: usize,
        confidence: f32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            level,
            start_position,
            end_position: None,
            page_number: None,
            word_count: None,
            children: Vec::new(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Whether `position` falls in this chapter's own range. A chapter with
    /// no recorded end covers everything from its start onward.
    pub fn contains(&self, position: usize) -> bool {
        position >= self.start_position
            && self.end_position.is_none_or(|end| position < end)
    }
}

/// How a table of contents came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Automatic,
    Manual,
    Hybrid,
    Imported,
}

impl std::fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
            Self::Hybrid => "hybrid",
            Self::Imported => "imported",
        };
        f.write_str(name)
    }
}

/// Field changes for [`TableOfContents::update_chapter`]. `None` leaves the
/// field untouched.
#[derive(Debug, Clone, Default)]
pub struct ChapterUpdate {
    pub title: Option<String>,
    pub level: Option<u32>,
    pub start_position: Option<usize>,
    pub end_position: Option<usize>,
    pub confidence: Option<f32>,
}

/// The chapters around a reading position.
#[derive(Debug, Clone, Copy)]
pub struct Navigation<'a> {
    pub previous: Option<&'a Chapter>,
    pub current: &'a Chapter,
    pub next: Option<&'a Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOfContents {
    pub id: Uuid,
    pub document_id: String,
    pub chapters: Vec<Chapter>,
    pub generated_at: DateTime<Utc>,
    pub method: GenerationMethod,
    pub overall_confidence: f32,
}

impl TableOfContents {
    /// Wrap a freshly generated forest.
    pub fn automatic(
        document_id: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> Self {
        let mut toc = Self {
            id: Uuid::new_v4(),
            document_id: document_id.into(),
            chapters,
            generated_at: Utc::now(),
            method: GenerationMethod::Automatic,
            overall_confidence: 0.0,
        };
        toc.overall_confidence = toc.mean_confidence();
        toc
    }

    /// An empty table to be filled in by hand.
    pub fn manual(document_id: impl Into<String>) -> Self {
        Self {
            method: GenerationMethod::Manual,
            ..Self::automatic(document_id, Vec::new())
        }
    }

    /// Rebuild a table from its JSON form. The result is marked imported.
    pub fn import(json: &str) -> Result<Self> {
        let mut toc: Self = serde_json::from_str(json)?;
        toc.method = GenerationMethod::Imported;
        toc.overall_confidence = toc.mean_confidence();
        Ok(toc)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Mean confidence over every chapter at every depth.
    pub fn mean_confidence(&self) -> f32 {
        let all = self.flatten();
        if all.is_empty() {
            return 0.0;
        }
        all.iter().map(|c| c.confidence).sum::<f32>() / all.len() as f32
    }

    /// All chapters, depth-first, parents before children.
    pub fn flatten(&self) -> Vec<&Chapter> {
        let mut out = Vec::new();
        flatten_into(&self.chapters, &mut out);
        out
    }

    pub fn chapter_count(&self) -> usize {
        self.flatten().len()
    }

    /// Deepest nesting in the forest; 0 when empty.
    pub fn depth(&self) -> usize {
        fn depth_of(chapters: &[Chapter]) -> usize {
            chapters
                .iter()
                .map(|c| 1 + depth_of(&c.children))
                .max()
                .unwrap_or(0)
        }
        depth_of(&self.chapters)
    }

    pub fn find(&self, id: u32) -> Option<&Chapter> {
        find_in(&self.chapters, id)
    }

    /// The most specific chapter whose range contains `position`.
    ///
    /// Children are searched before their parent is considered, so a
    /// subsection wins over the chapter it belongs to.
    pub fn chapter_at(&self, position: usize) -> Option<&Chapter> {
        deepest_at(&self.chapters, position)
    }

    /// Previous/current/next around chapter `id`, over all chapters sorted
    /// by start position.
    pub fn navigation(&self, id: u32) -> Option<Navigation<'_>> {
        let ordered = self.reading_order();
        let index = ordered.iter().position(|c| c.id == id)?;
        Some(Navigation {
            previous: index.checked_sub(1).map(|i| ordered[i]),
            current: ordered[index],
            next: ordered.get(index + 1).copied(),
        })
    }

    /// Navigation around whatever chapter contains `position`.
    pub fn navigation_at(&self, position: usize) -> Option<Navigation<'_>> {
        let current = self.chapter_at(position)?;
        self.navigation(current.id)
    }

    /// Add `chapter` under `parent` (or as a root), keeping siblings in start
    /// order. The chapter receives a fresh id, which is returned.
    ///
    /// Without an explicit end, the chapter runs to the next sibling's
    /// start, else to the end of the range it splits, else to its parent's
    /// end. A preceding sibling that would overlap is cut at the new start.
    pub fn add_chapter(
        &mut self,
        parent: Option<u32>,
        mut chapter: Chapter,
    ) -> Result<u32> {
        let start = chapter.start_position;
        if let Some(end) = chapter.end_position
            && end < start
        {
            return Err(Error::Config(format!(
                "chapter would end ({end}) before it starts ({start})"
            )));
        }

        let id = self.next_id();
        chapter.id = id;

        let (siblings, parent_end) = match parent {
            None => (&mut self.chapters, None),
            Some(parent_id) => {
                let parent = find_in_mut(&mut self.chapters, parent_id)
                    .ok_or_else(|| chapter_not_found(parent_id))?;
                let end = parent.end_position;
                (&mut parent.children, end)
            }
        };
        let at = siblings
            .iter()
            .position(|c| c.start_position > start)
            .unwrap_or(siblings.len());

        let previous = at.checked_sub(1).map(|i| &mut siblings[i]);
        let split_end = previous
            .as_ref()
            .and_then(|p| p.end_position)
            .filter(|&end| end > start);
        if let Some(previous) = previous
            && previous.end_position.is_none_or(|end| end > start)
        {
            previous.end_position = Some(start);
            previous.word_count = Some(start - previous.start_position);
        }

        if chapter.end_position.is_none() {
            chapter.end_position = siblings
                .get(at)
                .map(|next| next.start_position)
                .or(split_end)
                .or(parent_end.filter(|&end| end > start));
            chapter.word_count = chapter.end_position.map(|end| end - start);
        }
        siblings.insert(at, chapter);

        self.touch();
        Ok(id)
    }

    pub fn update_chapter(
        &mut self,
        id: u32,
        update: ChapterUpdate,
    ) -> Result<()> {
        let chapter = find_in_mut(&mut self.chapters, id)
            .ok_or_else(|| chapter_not_found(id))?;

        let start = update.start_position.unwrap_or(chapter.start_position);
        let end = update.end_position.or(chapter.end_position);
        if let Some(end) = end
            && end < start
        {
            return Err(Error::Config(format!(
                "chapter {id} would end ({end}) before it starts ({start})"
            )));
        }

        chapter.start_position = start;
        chapter.end_position = end;
        if let Some(title) = update.title {
            chapter.title = title;
        }
        if let Some(level) = update.level {
            chapter.level = level;
        }
        if let Some(confidence) = update.confidence {
            chapter.confidence = confidence.clamp(0.0, 1.0);
        }

        if update.start_position.is_some()
            && let Some(siblings) = siblings_of_mut(&mut self.chapters, id)
        {
            siblings.sort_by_key(|c| c.start_position);
        }

        self.touch();
        Ok(())
    }

    /// Remove chapter `id` together with its subtree.
    pub fn remove_chapter(&mut self, id: u32) -> Result<Chapter> {
        let removed = remove_in(&mut self.chapters, id)
            .ok_or_else(|| chapter_not_found(id))?;
        self.touch();
        Ok(removed)
    }

    fn next_id(&self) -> u32 {
        self.flatten().iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    fn reading_order(&self) -> Vec<&Chapter> {
        let mut ordered = self.flatten();
        ordered.sort_by_key(|c| c.start_position);
        ordered
    }

    fn touch(&mut self) {
        if matches!(
            self.method,
            GenerationMethod::Automatic | GenerationMethod::Imported
        ) {
            self.method = GenerationMethod::Hybrid;
        }
        self.overall_confidence = self.mean_confidence();
    }
}

fn chapter_not_found(id: u32) -> Error {
    Error::NotFound {
        kind: "chapter",
        name: id.to_string(),
    }
}

fn flatten_into<'a>(chapters: &'a [Chapter], out: &mut Vec<&'a Chapter>) {
    for chapter in chapters {
        out.push(chapter);
        flatten_into(&chapter.children, out);
    }
}

fn find_in(chapters: &[Chapter], id: u32) -> Option<&Chapter> {
    for chapter in chapters {
        if chapter.id == id {
            return Some(chapter);
        }
        if let Some(found) = find_in(&chapter.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut(chapters: &mut [Chapter], id: u32) -> Option<&mut Chapter> {
    for chapter in chapters {
        if chapter.id == id {
            return Some(chapter);
        }
        if let Some(found) = find_in_mut(&mut chapter.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_in(chapters: &mut Vec<Chapter>, id: u32) -> Option<Chapter> {
    if let Some(index) = chapters.iter().position(|c| c.id == id) {
        return Some(chapters.remove(index));
    }
    chapters
        .iter_mut()
        .find_map(|chapter| remove_in(&mut chapter.children, id))
}

/// The sibling list that holds chapter `id`.
fn siblings_of_mut(
    chapters: &mut Vec<Chapter>,
    id: u32,
) -> Option<&mut Vec<Chapter>> {
    if chapters.iter().any(|c| c.id == id) {
        return Some(chapters);
    }
    chapters
        .iter_mut()
        .find_map(|chapter| siblings_of_mut(&mut chapter.children, id))
}

fn deepest_at(chapters: &[Chapter], position: usize) -> Option<&Chapter> {
    for chapter in chapters {
        if let Some(found) = deepest_at(&chapter.children, position) {
            return Some(found);
        }
        if chapter.contains(position) {
            return Some(chapter);
        }
    }
    None
}
