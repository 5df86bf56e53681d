//! Built-in fold extractors.
//!
//! Each extractor makes one forward pass over the document with a small stack of open constructs.

use crate::markdown::{Fence, fence_open, heading_level};
use editor_syntax::{CancelToken, FoldError, FoldExtractor, FoldKind, FoldRegion, OpenStack};

fn check(cancel: &CancelToken) -> Result<(), FoldError> {
    if cancel.is_cancelled() {
        Err(FoldError::Cancelled)
    } else {
        Ok(())
    }
}

fn last_line(lines: &[String]) -> usize {
    lines.len().saturating_sub(1)
}

/// Brace blocks, block comments, Java text blocks and JavaScript template literals.
///
/// String literals and line comments are skipped so braces inside them do not count.
#[derive(Debug, Clone, Copy, Default)]
pub struct CStyleFoldExtractor {
    text_blocks: bool,
    template_literals: bool,
}

impl CStyleFoldExtractor {
    /// Extractor for Java (`"""` text blocks).
    pub fn java() -> Self {
        Self {
            text_blocks: true,
            template_literals: false,
        }
    }

    /// Extractor for JavaScript (template literals with `${ ... }` expressions).
    pub fn javascript() -> Self {
        Self {
            text_blocks: false,
            template_literals: true,
        }
    }
}

/// A construct that suspends brace matching.
#[derive(Clone, Copy)]
enum Skip {
    Comment(usize),
    TextBlock(usize),
    Quote(char),
}

impl FoldExtractor for CStyleFoldExtractor {
    fn extract(&self, lines: &[String], cancel: &CancelToken) -> Result<Vec<FoldRegion>, FoldError> {
        let mut stack = OpenStack::new();
        let mut skip: Option<Skip> = None;

        for (line_no, line) in lines.iter().enumerate() {
            check(cancel)?;
            let chars: Vec<char> = line.chars().collect();
            let at = |i: usize, pat: &str| pat.chars().enumerate().all(|(k, p)| chars.get(i + k) == Some(&p));
            let mut i = 0;

            while i < chars.len() {
                let c = chars[i];

                match skip {
                    Some(Skip::Comment(start)) => {
                        if at(i, "*/") {
                            stack.emit(start, line_no, FoldKind::BlockComment, stack.depth() + 1);
                            skip = None;
                            i += 2;
                        } else {
                            i += 1;
                        }
                        continue;
                    }
                    Some(Skip::TextBlock(start)) => {
                        if c == '\\' {
                            i += 2;
                        } else if at(i, "\"\"\"") {
                            stack.emit(start, line_no, FoldKind::JavaTextBlock, stack.depth() + 1);
                            skip = None;
                            i += 3;
                        } else {
                            i += 1;
                        }
                        continue;
                    }
                    Some(Skip::Quote(quote)) => {
                        if c == '\\' {
                            i += 2;
                        } else {
                            if c == quote {
                                skip = None;
                            }
                            i += 1;
                        }
                        continue;
                    }
                    None => {}
                }

                if stack.top() == Some(FoldKind::JsTemplateBlock) {
                    if c == '\\' {
                        i += 2;
                    } else if c == '`' {
                        stack.pop(line_no);
                        i += 1;
                    } else if at(i, "${") {
                        stack.push(line_no, FoldKind::JsTemplateExpression);
                        i += 2;
                    } else {
                        i += 1;
                    }
                    continue;
                }

                if at(i, "//") {
                    break;
                }
                if at(i, "/*") {
                    skip = Some(Skip::Comment(line_no));
                    i += 2;
                    continue;
                }
                if self.text_blocks && at(i, "\"\"\"") {
                    skip = Some(Skip::TextBlock(line_no));
                    i += 3;
                    continue;
                }
                match c {
                    '"' | '\'' => skip = Some(Skip::Quote(c)),
                    '`' if self.template_literals => stack.push(line_no, FoldKind::JsTemplateBlock),
                    '{' => stack.push(line_no, FoldKind::BraceBlock),
                    '}' => {
                        if matches!(
                            stack.top(),
                            Some(FoldKind::BraceBlock | FoldKind::JsTemplateExpression)
                        ) {
                            stack.pop(line_no);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }

            // Plain quotes end with the line unless the line break is escaped.
            if let Some(Skip::Quote(_)) = skip
                && !line.ends_with('\\')
            {
                skip = None;
            }
        }

        let end = last_line(lines);
        match skip {
            Some(Skip::Comment(start)) => {
                stack.emit(start, end, FoldKind::BlockComment, stack.depth() + 1)
            }
            Some(Skip::TextBlock(start)) => {
                stack.emit(start, end, FoldKind::JavaTextBlock, stack.depth() + 1)
            }
            _ => {}
        }
        Ok(stack.finish(end))
    }
}

/// Object and array containers of a JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFoldExtractor;

impl FoldExtractor for JsonFoldExtractor {
    fn extract(&self, lines: &[String], cancel: &CancelToken) -> Result<Vec<FoldRegion>, FoldError> {
        let mut stack = OpenStack::new();
        let mut in_string = false;

        for (line_no, line) in lines.iter().enumerate() {
            check(cancel)?;
            let mut chars = line.chars();
            while let Some(c) = chars.next() {
                if in_string {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => in_string = false,
                        _ => {}
                    }
                    continue;
                }
                match c {
                    '"' => in_string = true,
                    '{' => stack.push(line_no, FoldKind::JsonObject),
                    '[' => stack.push(line_no, FoldKind::JsonArray),
                    '}' if stack.top() == Some(FoldKind::JsonObject) => {
                        stack.pop(line_no);
                    }
                    ']' if stack.top() == Some(FoldKind::JsonArray) => {
                        stack.pop(line_no);
                    }
                    _ => {}
                }
            }
        }

        Ok(stack.finish(last_line(lines)))
    }
}

/// Fenced code blocks and heading sections.
///
/// A section runs from its heading to the last non-blank line before the next heading of the same
/// or a higher level. Headings inside fences are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFoldExtractor;

impl FoldExtractor for MarkdownFoldExtractor {
    fn extract(&self, lines: &[String], cancel: &CancelToken) -> Result<Vec<FoldRegion>, FoldError> {
        let mut regions = Vec::new();
        // (level, start_line)
        let mut sections: Vec<(usize, usize)> = Vec::new();
        let mut fence: Option<(Fence, usize)> = None;
        let mut last_content: Option<usize> = None;

        let close_sections =
            |sections: &mut Vec<(usize, usize)>, regions: &mut Vec<FoldRegion>, min_level: usize, end: Option<usize>| {
                while let Some(&(level, start)) = sections.last() {
                    if level < min_level {
                        break;
                    }
                    sections.pop();
                    if let Some(end) = end
                        && end > start
                    {
                        regions.push(FoldRegion::new(
                            start,
                            end,
                            FoldKind::MarkdownSection,
                            sections.len() + 1,
                        ));
                    }
                }
            };

        for (line_no, line) in lines.iter().enumerate() {
            check(cancel)?;

            if let Some((open, start)) = fence {
                if open.is_closed_by(line) {
                    if line_no > start {
                        regions.push(FoldRegion::new(
                            start,
                            line_no,
                            FoldKind::MarkdownFence,
                            sections.len() + 1,
                        ));
                    }
                    fence = None;
                }
                last_content = Some(line_no);
                continue;
            }

            if let Some(open) = fence_open(line) {
                fence = Some((open, line_no));
            } else if let Some(level) = heading_level(line) {
                close_sections(&mut sections, &mut regions, level, last_content);
                sections.push((level, line_no));
            }

            if !line.trim().is_empty() {
                last_content = Some(line_no);
            }
        }

        let end = last_line(lines);
        if let Some((_, start)) = fence
            && end > start
        {
            regions.push(FoldRegion::new(
                start,
                end,
                FoldKind::MarkdownFence,
                sections.len() + 1,
            ));
            last_content = Some(end);
        }
        close_sections(&mut sections, &mut regions, 0, last_content);

        Ok(regions)
    }
}
