//! Size-hierarchy section builder.
//!
//! Every run opens, extends or closes a section depending on how its font
//! size compares with the previous run. Keyword headings bypass the size
//! rule and are placed under a fixed anchor so that back-matter headings
//! typeset at body size still become sections.

use papersense_core::TextRun;

use crate::ParsingError;
use crate::profile::{BibliographyLocator, KeywordMatch, NestedConfig, SliceRule};
use crate::section::{Origin, SectionId, SectionTree};

const INTRODUCTION: &str = "Introduction";

fn is_override(text: &str, config: &NestedConfig) -> bool {
    match config.keyword_match {
        KeywordMatch::Exact => config.override_keywords.iter().any(|k| k == text),
        KeywordMatch::CaseInsensitive => {
            let lowered = text.to_lowercase();
            config
                .override_keywords
                .iter()
                .any(|k| k.to_lowercase() == lowered)
        }
    }
}

/// Build the section tree from runs.
///
/// Whitespace-only runs carry no structure and are skipped.
pub fn build_tree(runs: &[TextRun], config: &NestedConfig) -> SectionTree {
    let mut tree = SectionTree::new();
    let mut current = tree.root();
    let mut prev_size = f32::INFINITY;

    for run in runs {
        let text = run.text.trim();
        if text.is_empty() {
            continue;
        }
        let size = run.font_size;

        if is_override(text, config) {
            let anchor = tree.last_child_path(config.anchor_depth);
            tracing::trace!(heading = text, "keyword override");
            current = tree.add_child(anchor, text, size, Origin::Override);
        } else if size == prev_size {
            tree.extend(current, text);
        } else if size < prev_size {
            current = tree.add_child(current, text, size, Origin::Size);
        } else {
            current = tree.backtrack_add(current, text, size);
        }
        prev_size = size;
    }

    tracing::debug!(sections = tree.len() - 1, "built section tree");
    tree
}

/// The nodes a [`SliceRule`] selects, in order.
pub fn slice(tree: &SectionTree, rule: SliceRule) -> Vec<SectionId> {
    match rule {
        SliceRule::RootChildren => tree.children(tree.root()).to_vec(),
        SliceRule::LastChildChildren { depth } => {
            tree.children(tree.last_child_path(depth)).to_vec()
        }
        SliceRule::MergeLastTwo => {
            let Some(body) = tree.last_child(tree.root()) else {
                return Vec::new();
            };
            let parts = tree.children(body);
            let from = parts.len().saturating_sub(2);
            parts[from..]
                .iter()
                .flat_map(|&p| tree.children(p).iter().copied())
                .collect()
        }
    }
}

fn position(tree: &SectionTree, sections: &[SectionId], heading: &str) -> Option<usize> {
    sections.iter().position(|&id| tree.heading(id).trim() == heading)
}

/// Move every section whose own text is longer than `threshold` characters
/// under a new "Introduction" placed where the first of them was.
fn fold_oversized(tree: &mut SectionTree, sections: &mut Vec<SectionId>, threshold: usize) {
    let oversized: Vec<usize> = sections
        .iter()
        .enumerate()
        .filter(|&(_, &id)| tree.node(id).full_text().chars().count() > threshold)
        .map(|(i, _)| i)
        .collect();
    let Some(&first) = oversized.first() else {
        return;
    };

    let first_id = sections[first];
    let parent = tree.parent(first_id).unwrap_or(tree.root());
    let slot = tree
        .children(parent)
        .iter()
        .position(|&c| c == first_id)
        .unwrap_or(0);
    let size = oversized
        .iter()
        .map(|&i| tree.node(sections[i]).font_size)
        .fold(f32::NEG_INFINITY, f32::max);
    let intro = tree.insert_child(parent, slot, INTRODUCTION, size, Origin::Synthetic);

    for &i in &oversized {
        tree.reparent(sections[i], intro);
    }

    tracing::debug!(folded = oversized.len(), threshold, "refolded oversized fragments");

    let mut rebuilt = Vec::with_capacity(sections.len() - oversized.len() + 1);
    for (i, &id) in sections.iter().enumerate() {
        if i == first {
            rebuilt.push(intro);
        }
        if !oversized.contains(&i) {
            rebuilt.push(id);
        }
    }
    *sections = rebuilt;
}

/// Select the section list from the tree and apply the profile's
/// post-processing steps in order: fold, refold oversized, trim.
pub fn select_sections(
    tree: &mut SectionTree,
    config: &NestedConfig,
    bibliography: &BibliographyLocator,
    journal: &str,
) -> Result<Vec<SectionId>, ParsingError> {
    let mut sections = slice(tree, config.slice);

    if let Some(heading) = &config.fold_after {
        let idx = position(tree, &sections, heading).ok_or_else(|| {
            ParsingError::SectionNotFound {
                journal: journal.to_string(),
                section: heading.clone(),
            }
        })?;
        if idx + 1 < sections.len() {
            let next = sections.remove(idx + 1);
            tree.reparent(next, sections[idx]);
        }
    }

    if let Some(threshold) = config.oversized_threshold {
        fold_oversized(tree, &mut sections, threshold);
    }

    if let Some(heading) = &config.start_at {
        let idx = position(tree, &sections, heading).ok_or_else(|| {
            ParsingError::SectionNotFound {
                journal: journal.to_string(),
                section: heading.clone(),
            }
        })?;
        sections.drain(..idx);
    }

    let leading = config.drop_leading.min(sections.len());
    sections.drain(..leading);

    if config.end_at_bibliography {
        if let BibliographyLocator::Heading(heading) = bibliography {
            if let Some(idx) = position(tree, &sections, heading) {
                sections.truncate(idx + 1);
            }
        }
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, size: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            font_family: "Times".to_string(),
            font_size: size,
            page_index: 0,
        }
    }

    fn headings(tree: &SectionTree, ids: &[SectionId]) -> Vec<String> {
        ids.iter().map(|&id| tree.heading(id).to_string()).collect()
    }

    #[test]
    fn builds_hierarchy_from_sizes() {
        let runs = vec![
            run("Abstract", 12.0),
            run("This paper studies X (Smith, 1999).", 10.0),
            run("References", 12.0),
            run("Smith, J. (1999). A study of X. Journal.", 10.0),
        ];
        let tree = build_tree(&runs, &NestedConfig::default());
        let top = slice(&tree, SliceRule::RootChildren);
        assert_eq!(headings(&tree, &top), vec!["Abstract", "References"]);
        assert_eq!(
            tree.body_contents(top[0]),
            "This paper studies X (Smith, 1999)."
        );
        assert_eq!(
            tree.body_contents(top[1]),
            "Smith, J. (1999). A study of X. Journal."
        );
    }

    #[test]
    fn equal_sizes_extend_current_section() {
        let runs = vec![run("Intro", 12.0), run("a", 10.0), run("b", 10.0)];
        let mut with_gap = runs.clone();
        with_gap.insert(2, run("   ", 8.0));
        for runs in [runs, with_gap] {
            let tree = build_tree(&runs, &NestedConfig::default());
            let intro = tree.children(tree.root())[0];
            let paras = tree.children(intro);
            assert_eq!(paras.len(), 1);
            assert_eq!(tree.node(paras[0]).full_text(), "a b");
        }
    }

    #[test]
    fn keyword_override_ignores_size() {
        let config = NestedConfig {
            override_keywords: vec!["References".into()],
            anchor_depth: 1,
            ..Default::default()
        };
        let runs = vec![
            run("Body", 14.0),
            run("Methods", 11.0),
            run("text", 10.0),
            run("References", 10.0),
            run("Smith, J. (1999).", 9.0),
        ];
        let tree = build_tree(&runs, &config);
        let body = tree.children(tree.root())[0];
        let under_body = headings(&tree, tree.children(body));
        assert_eq!(under_body, vec!["Methods", "References"]);
        let refs = tree.children(body)[1];
        assert_eq!(tree.node(refs).origin, Origin::Override);
        assert_eq!(tree.body_contents(refs), "Smith, J. (1999).");
    }

    #[test]
    fn case_insensitive_override() {
        let config = NestedConfig {
            override_keywords: vec!["references".into()],
            keyword_match: KeywordMatch::CaseInsensitive,
            ..Default::default()
        };
        let tree = build_tree(&[run("Intro", 12.0), run("REFERENCES", 10.0)], &config);
        assert_eq!(
            headings(&tree, tree.children(tree.root())),
            vec!["Intro", "REFERENCES"]
        );
    }

    #[test]
    fn size_created_sections_never_exceed_parent() {
        let sizes = [14.0, 12.0, 10.0, 10.0, 9.0, 12.0, 11.0, 16.0, 8.0, 12.0];
        let runs: Vec<TextRun> = sizes
            .iter()
            .enumerate()
            .map(|(i, &s)| run(&format!("run {i}"), s))
            .collect();
        let tree = build_tree(&runs, &NestedConfig::default());
        for id in tree.ids() {
            let size = tree.node(id).font_size;
            for ancestor in tree.ancestors(id) {
                assert!(tree.node(ancestor).font_size >= size);
            }
        }
    }

    #[test]
    fn merge_last_two_concatenates_children() {
        let runs = vec![
            run("Body", 16.0),
            run("Part A", 14.0),
            run("a1", 12.0),
            run("a2", 12.5),
            run("Part B", 14.0),
            run("b1", 12.0),
        ];
        let mut runs_single = runs.clone();
        runs_single.truncate(4);
        let tree = build_tree(&runs, &NestedConfig::default());
        assert_eq!(
            headings(&tree, &slice(&tree, SliceRule::MergeLastTwo)),
            vec!["a1", "a2", "b1"]
        );
        let tree = build_tree(&runs_single, &NestedConfig::default());
        assert_eq!(
            headings(&tree, &slice(&tree, SliceRule::MergeLastTwo)),
            vec!["a1", "a2"]
        );
    }

    #[test]
    fn fold_after_absorbs_next_sibling() {
        let config = NestedConfig {
            fold_after: Some("Abstract.".into()),
            ..Default::default()
        };
        let mut tree = SectionTree::new();
        let root = tree.root();
        tree.add_child(root, "Title", 14.0, Origin::Size);
        let a = tree.add_child(root, "Abstract.", 12.0, Origin::Size);
        let b = tree.add_child(root, "We study teams.", 12.0, Origin::Size);
        let c = tree.add_child(root, "Method", 12.0, Origin::Size);
        let sections = select_sections(
            &mut tree,
            &config,
            &BibliographyLocator::LastSection,
            "test",
        )
        .unwrap();
        assert_eq!(&sections[1..], &[a, c]);
        assert_eq!(tree.children(a), &[b]);
    }

    #[test]
    fn missing_fold_heading_is_section_not_found() {
        let config = NestedConfig {
            fold_after: Some("Abstract.".into()),
            ..Default::default()
        };
        let mut tree = build_tree(&[run("Intro", 12.0)], &NestedConfig::default());
        let err = select_sections(
            &mut tree,
            &config,
            &BibliographyLocator::LastSection,
            "orgsci",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParsingError::SectionNotFound { ref journal, ref section }
                if journal == "orgsci" && section == "Abstract."
        ));
    }

    #[test]
    fn oversized_sections_fold_into_introduction() {
        let config = NestedConfig {
            oversized_threshold: Some(20),
            ..Default::default()
        };
        let mut tree = SectionTree::new();
        let root = tree.root();
        let a = tree.add_child(root, "Abstract", 12.0, Origin::Size);
        let long1 = tree.add_child(root, "A long unheaded paragraph of text", 12.0, Origin::Size);
        let m = tree.add_child(root, "Methods", 12.0, Origin::Size);
        let long2 = tree.add_child(root, "Another long unheaded paragraph", 12.0, Origin::Size);

        let sections = select_sections(
            &mut tree,
            &config,
            &BibliographyLocator::LastSection,
            "test",
        )
        .unwrap();
        assert_eq!(
            headings(&tree, &sections),
            vec!["Abstract", "Introduction", "Methods"]
        );
        let intro = sections[1];
        assert_eq!(tree.children(intro), &[long1, long2]);
        assert_eq!(tree.children(root), &[a, intro, m]);
        assert_eq!(tree.node(intro).origin, Origin::Synthetic);
    }

    #[test]
    fn start_at_and_end_at_bibliography_trim() {
        let config = NestedConfig {
            start_at: Some("Abstract".into()),
            drop_leading: 1,
            end_at_bibliography: true,
            ..Default::default()
        };
        let mut tree = SectionTree::new();
        let root = tree.root();
        for h in ["Title", "Abstract", "Intro", "Method", "REFERENCES", "Bios"] {
            tree.add_child(root, h, 12.0, Origin::Size);
        }
        let sections = select_sections(
            &mut tree,
            &config,
            &BibliographyLocator::Heading("REFERENCES".into()),
            "test",
        )
        .unwrap();
        assert_eq!(
            headings(&tree, &sections),
            vec!["Intro", "Method", "REFERENCES"]
        );
    }
}
