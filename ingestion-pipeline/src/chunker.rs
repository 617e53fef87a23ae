use text_splitter::TextSplitter;

use common::error::AppError;

/// One section of a runbook body, pre-embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// Splits a runbook body into sections at H2/H3 headings, keeping fenced
/// code blocks atomic and enforcing a size window on each section.
///
/// Sections shorter than `min_chars` are merged forward; sections longer
/// than `max_chars` are hard-split on paragraph boundaries. An oversized
/// fenced code block wins over the maximum: fences are never split.
pub struct MarkdownChunker {
    min_chars: usize,
    max_chars: usize,
}

impl MarkdownChunker {
    pub fn new(min_chars: usize, max_chars: usize) -> Result<Self, AppError> {
        if max_chars == 0 || min_chars > max_chars {
            return Err(AppError::Validation(format!(
                "Invalid chunk window: min {min_chars}, max {max_chars}"
            )));
        }
        Ok(Self {
            min_chars,
            max_chars,
        })
    }

    /// Chunk a document body. `fallback_title` names the preamble before the
    /// first heading (typically the front-matter title or the file stem).
    pub fn chunk(&self, fallback_title: &str, body: &str) -> Vec<Section> {
        let sections = split_at_headings(fallback_title, body);
        let merged = self.merge_small(sections);
        merged
            .into_iter()
            .flat_map(|section| self.split_large(section))
            .collect()
    }

    fn merge_small(&self, sections: Vec<Section>) -> Vec<Section> {
        let mut result: Vec<Section> = Vec::new();
        let mut pending: Option<Section> = None;

        for section in sections {
            let combined = match pending.take() {
                Some(previous) => Section {
                    title: previous.title,
                    content: join_blocks(&previous.content, &section.content),
                },
                None => section,
            };

            if combined.content.len() < self.min_chars {
                pending = Some(combined);
            } else {
                result.push(combined);
            }
        }

        // A small trailing section has nothing ahead to merge into; fold it
        // into the previous chunk instead of dropping it.
        if let Some(rest) = pending {
            match result.last_mut() {
                Some(last) => last.content = join_blocks(&last.content, &rest.content),
                None => result.push(rest),
            }
        }

        result
    }

    fn split_large(&self, section: Section) -> Vec<Section> {
        if section.content.len() <= self.max_chars {
            return vec![section];
        }

        let mut parts: Vec<Section> = Vec::new();
        let mut current = String::new();

        for block in split_blocks(&section.content) {
            let block_is_fence = block.trim_start().starts_with("```");

            if !current.is_empty() && current.len() + block.len() + 2 > self.max_chars {
                parts.push(Section {
                    title: section.title.clone(),
                    content: std::mem::take(&mut current),
                });
            }

            if block.len() > self.max_chars && !block_is_fence {
                // A single oversized paragraph: let the splitter find
                // sentence-ish boundaries below the maximum.
                let splitter = TextSplitter::new(self.max_chars);
                for piece in splitter.chunks(&block) {
                    parts.push(Section {
                        title: section.title.clone(),
                        content: piece.to_string(),
                    });
                }
            } else {
                current = join_blocks(&current, &block);
            }
        }

        if !current.is_empty() {
            parts.push(Section {
                title: section.title.clone(),
                content: current,
            });
        }

        parts
    }
}

/// Split section content into paragraph blocks, keeping each fenced code
/// block as a single unsplittable block.
fn split_blocks(content: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_fence = false;

    let mut flush = |current: &mut String, blocks: &mut Vec<String>| {
        let trimmed = current.trim_end();
        if !trimmed.trim().is_empty() {
            blocks.push(trimmed.to_string());
        }
        current.clear();
    };

    for line in content.lines() {
        let fence_delimiter = line.trim_start().starts_with("```");

        if in_fence {
            current.push_str(line);
            current.push('\n');
            if fence_delimiter {
                flush(&mut current, &mut blocks);
                in_fence = false;
            }
            continue;
        }

        if fence_delimiter {
            flush(&mut current, &mut blocks);
            in_fence = true;
            current.push_str(line);
            current.push('\n');
            continue;
        }

        if line.trim().is_empty() {
            flush(&mut current, &mut blocks);
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }

    flush(&mut current, &mut blocks);
    blocks
}

fn join_blocks(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{left}\n\n{right}"),
    }
}

/// Split a body into sections at H2/H3 headings, ignoring headings inside
/// fenced code blocks.
fn split_at_headings(fallback_title: &str, body: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut title = fallback_title.to_string();
    let mut content = String::new();
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }

        let heading = if in_fence {
            None
        } else {
            line.strip_prefix("## ")
                .or_else(|| line.strip_prefix("### "))
        };

        if let Some(heading) = heading {
            push_section(&mut sections, &mut title, &mut content, heading);
        } else {
            content.push_str(line);
            content.push('\n');
        }
    }

    let trimmed = content.trim();
    if !trimmed.is_empty() {
        sections.push(Section {
            title,
            content: trimmed.to_string(),
        });
    }

    sections
}

fn push_section(
    sections: &mut Vec<Section>,
    title: &mut String,
    content: &mut String,
    next_title: &str,
) {
    let trimmed = content.trim();
    if !trimmed.is_empty() {
        sections.push(Section {
            title: title.clone(),
            content: trimmed.to_string(),
        });
    }
    *title = next_title.trim().to_string();
    content.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(min: usize, max: usize) -> MarkdownChunker {
        MarkdownChunker::new(min, max).expect("chunker")
    }

    #[test]
    fn splits_at_h2_and_h3_headings_in_order() {
        let body = "intro paragraph that is long enough to stand alone here\n\n## Check memory\nrun free -h and inspect output\n\n### Swap\nreview swap usage with swapon\n";
        let sections = chunker(10, 2000).chunk("Memory", body);

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].title, "Memory");
        assert_eq!(sections[1].title, "Check memory");
        assert_eq!(sections[2].title, "Swap");
        assert!(sections[1].content.contains("free -h"));
    }

    #[test]
    fn headings_inside_code_fences_do_not_split() {
        let body = "## Diagnose\nsome diagnosis text that is long enough\n\n```\n## not a heading\necho hi\n```\nafter the fence\n";
        let sections = chunker(10, 2000).chunk("fallback", body);

        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.contains("## not a heading"));
        assert!(sections[0].content.contains("after the fence"));
    }

    #[test]
    fn small_sections_merge_forward() {
        let body = "## A\ntiny\n\n## B\nthis section is comfortably long enough to pass the minimum threshold\n";
        let sections = chunker(40, 2000).chunk("fallback", body);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "A");
        assert!(sections[0].content.contains("tiny"));
        assert!(sections[0].content.contains("comfortably long"));
    }

    #[test]
    fn small_trailing_section_merges_backward() {
        let body = "## A\nthis section is comfortably long enough to pass the minimum threshold\n\n## B\ntiny\n";
        let sections = chunker(40, 2000).chunk("fallback", body);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "A");
        assert!(sections[0].content.ends_with("tiny"));
    }

    #[test]
    fn oversized_sections_split_on_paragraphs() {
        let para_one = "alpha ".repeat(30);
        let para_two = "beta ".repeat(30);
        let body = format!("## Long\n{}\n\n{}\n", para_one.trim(), para_two.trim());

        let sections = chunker(10, 200).chunk("fallback", &body);

        assert!(sections.len() >= 2);
        assert!(sections.iter().all(|s| s.title == "Long"));
        assert!(sections.iter().all(|s| s.content.len() <= 200));
    }

    #[test]
    fn oversized_code_fence_stays_atomic() {
        let fence_body = "echo line\n".repeat(40);
        let body = format!("## Script\n```\n{fence_body}```\n");

        let sections = chunker(10, 120).chunk("fallback", &body);

        let fenced: Vec<_> = sections
            .iter()
            .filter(|s| s.content.contains("```"))
            .collect();
        assert_eq!(fenced.len(), 1);
        let fence = &fenced[0].content;
        assert_eq!(fence.matches("```").count(), 2, "fence must stay whole");
        assert_eq!(fence.matches("echo line").count(), 40);
    }

    #[test]
    fn invalid_window_is_rejected() {
        assert!(MarkdownChunker::new(100, 50).is_err());
        assert!(MarkdownChunker::new(0, 0).is_err());
    }
}
