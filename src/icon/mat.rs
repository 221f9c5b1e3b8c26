//! Icon material descriptors
//!
//! UI icon materials come in two shapes: the classic `material : "ui"` block
//! with a direct `texture` attribute, and the newer `effect : "ui.rfx"` block
//! whose texture lives in a nested `texture { source }` sub-block. SDF
//! variants additionally carry `aux[]` coefficient rows. This parser covers
//! exactly that subset of the text-config format.

use crate::error::{Error, Result};

/// One parsed `material` or `effect` block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatBlock {
    /// Block name, e.g. `ui` or `ui.sdf.rfx`
    pub name: String,
    /// Referenced texture path, as written in the descriptor
    pub texture: Option<String>,
    /// SDF auxiliary coefficients, flattened in declaration order
    pub aux: Vec<f32>,
}

/// A parsed material descriptor file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatFile {
    pub effect: Option<MatBlock>,
    pub material: Option<MatBlock>,
}

/// Parse a material descriptor.
///
/// # Errors
/// Fails on non-UTF-8 input or unbalanced braces; unknown attributes are
/// ignored.
pub fn parse(data: &[u8]) -> Result<MatFile> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::MatError(format!("descriptor is not UTF-8: {e}")))?;

    let mut file = MatFile::default();
    let mut block: Option<(bool, MatBlock)> = None; // (is_effect, block)
    let mut depth = 0i32;
    let mut in_texture_subblock = false;

    for raw_line in text.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let opens = line.matches('{').count() as i32;
        let closes = line.matches('}').count() as i32;

        if depth == 0 {
            if let Some(rest) = line.strip_prefix("effect") {
                block = Some((true, header_block(rest)?));
            } else if let Some(rest) = line.strip_prefix("material") {
                block = Some((false, header_block(rest)?));
            }
        } else if let Some((_, current)) = block.as_mut() {
            if let Some(value) = attribute(line, "source") {
                if in_texture_subblock && current.texture.is_none() {
                    current.texture = Some(value.to_string());
                }
            } else if let Some(value) = attribute(line, "texture") {
                if opens > 0 {
                    // effect form: `texture : "slot" {` opens a sub-block
                    in_texture_subblock = true;
                } else if current.texture.is_none() {
                    current.texture = Some(value.to_string());
                }
            } else if line.starts_with("aux") {
                current.aux.extend(floats_in(line));
            }
        }

        depth += opens - closes;
        if depth < 0 {
            return Err(Error::MatError("unbalanced braces".to_string()));
        }
        if depth <= 1 {
            in_texture_subblock = false;
        }
        if depth == 0 {
            if let Some((is_effect, done)) = block.take() {
                if is_effect {
                    file.effect.get_or_insert(done);
                } else {
                    file.material.get_or_insert(done);
                }
            }
        }
    }

    if depth != 0 {
        return Err(Error::MatError("unbalanced braces".to_string()));
    }
    Ok(file)
}

/// Parse the remainder of a block header line: `: "name" {`
fn header_block(rest: &str) -> Result<MatBlock> {
    let name = quoted(rest)
        .ok_or_else(|| Error::MatError(format!("missing block name in {rest:?}")))?;
    Ok(MatBlock {
        name: name.to_string(),
        ..MatBlock::default()
    })
}

/// Match `key : value` lines, returning the first quoted string of the value
fn attribute<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?;
    // Reject longer keys sharing the prefix, e.g. `texture_name`
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(':').or_else(|| rest.strip_prefix('{'))?;
    quoted(rest)
}

fn quoted(text: &str) -> Option<&str> {
    let start = text.find('"')? + 1;
    let end = start + text[start..].find('"')?;
    Some(&text[start..end])
}

fn floats_in(line: &str) -> Vec<f32> {
    let value = line.split_once(':').map_or("", |(_, v)| v);
    value
        .split(|c: char| !c.is_ascii_digit() && c != '.' && c != '-' && c != 'e')
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<f32>().ok())
        .collect()
}

fn strip_comment(line: &str) -> &str {
    let cut = line.find("//").or_else(|| line.find('#')).unwrap_or(line.len());
    &line[..cut]
}
