//! Course content sequencing.
//!
//! Lectures, grand quizzes and grand assignments are merged into one linear
//! sequence. For students every item is then annotated with its progress and a
//! lock flag: an item is locked unless the item directly before it is
//! completed. Only the immediate predecessor is consulted, so completing item
//! `i - 1` unlocks item `i` whatever the state of earlier items.

use std::collections::HashMap;

use crate::models::{
    ContentEntry, ContentKey, GrandAssignment, GrandQuiz, LectureWithCounts, Progress,
    SequencedItem,
};

/// Per-student completion state keyed by content item.
pub type CompletionMap = HashMap<ContentKey, Progress>;

/// Merges the three collections into course order: ascending order index,
/// then creation time, then content kind and id.
pub fn sequence(
    lectures: Vec<LectureWithCounts>,
    quizzes: Vec<GrandQuiz>,
    assignments: Vec<GrandAssignment>,
) -> Vec<ContentEntry> {
    let mut items: Vec<ContentEntry> = lectures
        .into_iter()
        .map(ContentEntry::Lecture)
        .chain(quizzes.into_iter().map(ContentEntry::GrandQuiz))
        .chain(assignments.into_iter().map(ContentEntry::GrandAssignment))
        .collect();

    items.sort_by(|a, b| {
        a.order_index()
            .cmp(&b.order_index())
            .then_with(|| a.created_at().cmp(b.created_at()))
            .then_with(|| a.kind().cmp(&b.kind()))
            .then_with(|| a.id().cmp(&b.id()))
    });
    items
}

fn is_completed(completion: &CompletionMap, key: &ContentKey) -> bool {
    completion.get(key).is_some_and(|p| p.completed)
}

/// Lock flag for every position of an ordered sequence.
pub fn lock_states(keys: &[ContentKey], completion: &CompletionMap) -> Vec<bool> {
    std::iter::once(false)
        .chain(keys.windows(2).map(|pair| !is_completed(completion, &pair[0])))
        .take(keys.len())
        .collect()
}

/// Whether `target` may be opened. `None` when it is not part of the sequence.
pub fn is_unlocked(keys: &[ContentKey], completion: &CompletionMap, target: ContentKey) -> Option<bool> {
    let position = keys.iter().position(|k| *k == target)?;
    Some(position == 0 || is_completed(completion, &keys[position - 1]))
}

pub fn annotate(items: Vec<ContentEntry>, completion: &CompletionMap) -> Vec<SequencedItem> {
    let keys: Vec<ContentKey> = items.iter().map(ContentEntry::key).collect();
    let locks = lock_states(&keys, completion);

    items
        .into_iter()
        .zip(locks)
        .map(|(entry, is_locked)| {
            let progress = completion.get(&entry.key()).copied().unwrap_or_default();
            SequencedItem {
                entry,
                progress,
                is_locked,
            }
        })
        .collect()
}
