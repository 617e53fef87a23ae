use serde::Deserialize;

use common::error::AppError;

/// Keys recognized in a runbook's YAML front-matter. Absent keys default to
/// empty.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RunbookFrontMatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "applicable-shapes")]
    pub applicable_shapes: Vec<String>,
}

/// Split a runbook document into its front-matter and body.
///
/// The front-matter block is delimited by lines containing exactly `---` at
/// the very start of the document; a document without one yields defaults
/// and the whole text as body. Malformed YAML inside the block is a parse
/// error.
pub fn split_front_matter(document: &str) -> Result<(RunbookFrontMatter, &str), AppError> {
    let Some(first_newline) = document.find('\n') else {
        return Ok((RunbookFrontMatter::default(), document));
    };

    let (first_line, after_open) = document.split_at(first_newline + 1);
    if first_line.trim_end() != "---" {
        return Ok((RunbookFrontMatter::default(), document));
    }

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = after_open.get(..offset).unwrap_or_default();
            let front: RunbookFrontMatter = if yaml.trim().is_empty() {
                RunbookFrontMatter::default()
            } else {
                serde_yaml::from_str(yaml)
                    .map_err(|e| AppError::Parse(format!("Invalid runbook front-matter: {e}")))?
            };
            let body = after_open.get(offset + line.len()..).unwrap_or("");
            return Ok((front, body));
        }
        offset += line.len();
    }

    // Opening delimiter without a closing one: treat the document as body.
    Ok((RunbookFrontMatter::default(), document))
}
