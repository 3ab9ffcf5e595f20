use std::collections::HashMap;

use super::Store;
use crate::error::Result;
use crate::types::{ChapterWithMedia, Placement, ReferenceWithMedia, Story, StoryDetail};

/// Loads chapters, references, and settings for a story and nests the
/// references under their placement. Chapters come back ordered by
/// `order`, references by `order` within each container.
pub fn assemble_story_detail(store: &dyn Store, story: Story) -> Result<StoryDetail> {
    let chapters = store.list_chapters(&story.id)?;
    let references = store.list_story_references(&story.id)?;
    let settings = store.get_story_settings(&story.id)?;

    let mut story_refs = Vec::new();
    let mut chapter_refs: HashMap<String, Vec<ReferenceWithMedia>> = HashMap::new();

    for entry in references {
        match &entry.reference.placement {
            Placement::Story => story_refs.push(entry),
            Placement::Chapter { chapter_id } => chapter_refs
                .entry(chapter_id.clone())
                .or_default()
                .push(entry),
        }
    }

    let chapters = chapters
        .into_iter()
        .map(|chapter| {
            let media_references = chapter_refs.remove(&chapter.id).unwrap_or_default();
            ChapterWithMedia {
                chapter,
                media_references,
            }
        })
        .collect();

    Ok(StoryDetail {
        story,
        chapters,
        media_references: story_refs,
        settings,
    })
}
