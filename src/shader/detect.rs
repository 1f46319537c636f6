// Stage detection
//
// GLSL and HLSL sources carry their stage in the file extension. Slang
// modules may host several entry points, each tagged with a
// `[shader("<stage>")]` attribute, so their content is scanned instead.

use super::language::{ShaderLanguage, SLANG_EXTENSION};
use super::stage::{ShaderStage, STAGE_COUNT};
use std::io;
use std::path::Path;

/// Stage of a single-stage source, taken from its extension
pub fn stage_from_extension(path: &Path) -> Option<ShaderStage> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ShaderStage::from_extension)
}

/// Whether `path` is a source file the given language compiles at all
pub fn is_candidate(path: &Path, language: ShaderLanguage) -> bool {
    if language.is_multi_stage() {
        path.extension().is_some_and(|ext| ext == SLANG_EXTENSION)
    } else {
        stage_from_extension(path).is_some()
    }
}

/// Detect the stages a source file contains.
///
/// Returns an empty list for files the language does not handle. Only
/// multi-stage sources are read from disk; bytes that are not UTF-8 are
/// replaced before scanning since markers are plain ASCII.
pub fn detect_stages(path: &Path, language: ShaderLanguage) -> io::Result<Vec<ShaderStage>> {
    if !is_candidate(path, language) {
        return Ok(Vec::new());
    }
    if language.is_multi_stage() {
        let bytes = std::fs::read(path)?;
        Ok(scan_stage_markers(&String::from_utf8_lossy(&bytes)))
    } else {
        Ok(stage_from_extension(path).into_iter().collect())
    }
}

/// Collect the stages declared by `[shader("...")]` attributes.
///
/// Markers inside comments are ignored and each stage is reported once,
/// in stage table order regardless of where it appears in the file.
pub fn scan_stage_markers(content: &str) -> Vec<ShaderStage> {
    let code = strip_comments(content);
    let mut found = [false; STAGE_COUNT];

    let mut rest = code.as_str();
    while let Some(open) = rest.find('[') {
        rest = &rest[open + 1..];
        let Some(close) = rest.find(']') else { break };
        for name in attribute_items(&rest[..close]).filter_map(parse_shader_attribute) {
            if let Some(stage) = ShaderStage::from_slang_name(name) {
                found[stage as usize] = true;
            }
        }
    }

    ShaderStage::all().filter(|stage| found[*stage as usize]).collect()
}

/// Split an attribute list on the commas outside parentheses and strings
fn attribute_items(list: &str) -> impl Iterator<Item = &str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                items.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&list[start..]);
    items.into_iter()
}

/// Parse one `shader ( "name" )` attribute item
fn parse_shader_attribute(item: &str) -> Option<&str> {
    let input = item.trim_start().strip_prefix("shader")?;
    let input = input.trim_start().strip_prefix('(')?;
    let input = input.trim_start().strip_prefix('"')?;
    let end = input.find('"')?;
    let (name, tail) = input.split_at(end);
    let tail = tail[1..].trim_start().strip_prefix(')')?;
    tail.trim().is_empty().then_some(name)
}

/// Replace `//` and `/* */` comments with whitespace, leaving string
/// literals untouched
fn strip_comments(source: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Str,
        Line,
        Block,
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match (c, chars.peek()) {
                ('/', Some('/')) => {
                    chars.next();
                    state = State::Line;
                    out.push(' ');
                }
                ('/', Some('*')) => {
                    chars.next();
                    state = State::Block;
                    out.push(' ');
                }
                ('"', _) => {
                    state = State::Str;
                    out.push(c);
                }
                _ => out.push(c),
            },
            State::Str => {
                out.push(c);
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    }
                    '"' | '\n' => state = State::Code,
                    _ => {}
                }
            }
            State::Line => {
                if c == '\n' {
                    state = State::Code;
                    out.push('\n');
                }
            }
            State::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                }
            }
        }
    }
    out
}
