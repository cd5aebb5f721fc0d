//! Parser for bnd-style `.feature` descriptor files.
//!
//! ```text
//! symbolicName=com.ibm.websphere.appserver.batchManagement-1.0
//! visibility=public
//! IBM-ShortName: batchManagement-1.0
//! -features=com.ibm.websphere.appserver.jdbc-4.0; ibm.tolerates:="4.1,4.2,4.3", \
//!   com.ibm.websphere.appserver.servlet-3.1
//! -bundles=com.ibm.ws.jbatch.rest
//! ```
//!
//! A descriptor with an `IBM-Provision-Capability` header is an
//! auto-feature; its capability filters become the activation condition.

use std::path::Path;

use crate::errors::{Error, Result};

use super::filter::parse_capabilities;
use super::model::{FeatureRecord, ToleranceGroup, Visibility};

const TOLERATES_ATTRIBUTE: &str = "ibm.tolerates";
const FILTER_ATTRIBUTE: &str = "filter";

/// One comma-separated entry of a header value: a name plus `;` attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderClause {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl HeaderClause {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse descriptor text into an unvalidated record.
pub fn parse_descriptor(text: &str, source: Option<&Path>) -> Result<FeatureRecord> {
    let malformed = |reason: String| Error::malformed(source.map(Path::to_path_buf), reason);

    let mut record = FeatureRecord {
        source: source.map(Path::to_path_buf),
        ..FeatureRecord::default()
    };
    let mut capability_filters: Vec<String> = Vec::new();
    let mut saw_capability_header = false;

    for (key, value) in logical_entries(text) {
        match key.to_ascii_lowercase().as_str() {
            "symbolicname" | "subsystem-symbolicname" => {
                let clauses = split_clauses(&value);
                let clause = clauses
                    .into_iter()
                    .next()
                    .ok_or_else(|| malformed(format!("empty {} header", key)))?;
                if let Some(vis) = clause.attribute("visibility") {
                    record.visibility = Visibility::parse(vis)
                        .ok_or_else(|| malformed(format!("unknown visibility [ {} ]", vis)))?;
                }
                record.symbolic_name = Some(clause.name);
            }
            "ibm-shortname" => {
                let name = value.trim();
                if !name.is_empty() {
                    record.short_name = Some(name.to_string());
                }
            }
            "visibility" => {
                record.visibility = Visibility::parse(&value)
                    .ok_or_else(|| malformed(format!("unknown visibility [ {} ]", value)))?;
            }
            "kind" => record.kind = Some(value.trim().to_string()),
            "-bundles" => {
                record
                    .bundles
                    .extend(split_clauses(&value).into_iter().map(|c| c.name));
            }
            "-features" => {
                for clause in split_clauses(&value) {
                    let group = match clause.attribute(TOLERATES_ATTRIBUTE) {
                        Some(versions) => ToleranceGroup::from_tolerates(
                            clause.name.clone(),
                            versions.split(','),
                        ),
                        None => ToleranceGroup::single(clause.name.clone()),
                    };
                    record.features.push(group);
                }
            }
            "ibm-provision-capability" => {
                saw_capability_header = true;
                for clause in split_clauses(&value) {
                    let filter = clause.attribute(FILTER_ATTRIBUTE).ok_or_else(|| {
                        malformed(format!(
                            "provision capability [ {} ] has no filter",
                            clause.name
                        ))
                    })?;
                    capability_filters.push(filter.to_string());
                }
            }
            _ => {}
        }
    }

    if saw_capability_header {
        if capability_filters.is_empty() {
            return Err(malformed("empty IBM-Provision-Capability header".into()));
        }
        let condition = parse_capabilities(capability_filters.iter().map(String::as_str))
            .map_err(malformed)?;
        record.activation = Some(condition);
        record.visibility = Visibility::Auto;
    }

    Ok(record)
}

/// Join continuation lines and split `key=value` / `key: value` entries.
fn logical_entries(text: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut pending = String::new();

    for raw in text.lines() {
        let line = raw.trim();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }
        match line.strip_suffix('\\') {
            Some(head) => {
                pending.push_str(head);
                pending.push(' ');
            }
            None => {
                pending.push_str(line);
                if let Some(entry) = split_entry(&pending) {
                    entries.push(entry);
                }
                pending.clear();
            }
        }
    }
    if !pending.is_empty() {
        if let Some(entry) = split_entry(&pending) {
            entries.push(entry);
        }
    }
    entries
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let idx = line.find(['=', ':'])?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), line[idx + 1..].trim().to_string()))
}

/// Split on `sep` outside double quotes.
fn split_unquoted(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, c) in value.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&value[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Split a header value into clauses of `name; attr:=value; attr=value`.
pub fn split_clauses(value: &str) -> Vec<HeaderClause> {
    split_unquoted(value, ',')
        .into_iter()
        .filter_map(|raw| {
            let mut segments = split_unquoted(raw, ';').into_iter();
            let name = segments.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let attributes = segments
                .filter_map(|segment| {
                    let (key, value) = segment.split_once('=')?;
                    let key = key.trim().trim_end_matches(':').trim();
                    let value = value.trim().trim_matches('"');
                    Some((key.to_string(), value.to_string()))
                })
                .collect();
            Some(HeaderClause {
                name: name.to_string(),
                attributes,
            })
        })
        .collect()
}
