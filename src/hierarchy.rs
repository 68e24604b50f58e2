//! Flat, leveled chapters to a nested forest.

use crate::toc::Chapter;

/// Nest `chapters` (in document order) by level.
///
/// Keeps a stack of open chapters. Each incoming chapter closes every open
/// chapter at the same or a deeper level, then becomes a child of whatever
/// is left on top, or a root when the stack is empty. Level gaps are fine: a
/// level-3 chapter right after a level-1 chapter nests directly under it.
///
/// ```
/// use folio::hierarchy::build_forest;
/// use folio::toc::Chapter;
///
/// let flat = vec![
///     Chapter::new(1, "Part One", 1, 0, 1.0),
///     Chapter::new(2, "Opening", 2, 10, 1.0),
///     Chapter::new(3, "Part Two", 1, 20, 1.0),
/// ];
/// let forest = build_forest(flat);
/// assert_eq!(forest.len(), 2);
/// assert_eq!(forest[0].children[0].title, "Opening");
/// ```
pub fn build_forest(chapters: Vec<Chapter>) -> Vec<Chapter> {
    let mut roots: Vec<Chapter> = Vec::new();
    let mut open: Vec<Chapter> = Vec::new();

    for mut chapter in chapters {
        chapter.children.clear();
        while open.last().is_some_and(|top| top.level >= chapter.level) {
            close_top(&mut open, &mut roots);
        }
        open.push(chapter);
    }
    while !open.is_empty() {
        close_top(&mut open, &mut roots);
    }

    roots
}

/// Pop the top open chapter and attach it to its parent, or to the roots.
fn close_top(open: &mut Vec<Chapter>, roots: &mut Vec<Chapter>) {
    let Some(done) = open.pop() else {
        return;
    };
    match open.last_mut() {
        Some(parent) => parent.children.push(done),
        None => roots.push(done),
    }
}
