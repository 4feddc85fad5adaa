//! iCalendar content-line reader.
//!
//! Turns raw text into a tree of `BEGIN`/`END` blocks holding ordered
//! properties. Nothing here interprets values; dates, escapes and the like
//! are the normalizer's business.

use crate::error::{AppResult, PlannerError};

/// One content line: `NAME;PARAM=VALUE:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub params: Vec<(String, Vec<String>)>,
    pub value: String,
    pub line: usize,
}

impl Property {
    /// First value of the named parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Block>,
    pub line: usize,
}

impl Block {
    fn new(name: String, line: usize) -> Self {
        Self {
            name,
            properties: Vec::new(),
            children: Vec::new(),
            line,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|p| p.value.as_str())
    }
}

/// Root of a parsed document: the top-level `VCALENDAR` blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarTree {
    pub calendars: Vec<Block>,
}

impl CalendarTree {
    /// Every `VEVENT`, in document order.
    pub fn events(&self) -> impl Iterator<Item = &Block> + '_ {
        self.calendars
            .iter()
            .flat_map(|cal| cal.children.iter())
            .filter(|block| block.name == "VEVENT")
    }
}

/// Parses iCalendar text. Any structural problem fails the whole read.
pub fn read_calendar(text: &str) -> AppResult<CalendarTree> {
    let mut tree = CalendarTree::default();
    let mut stack: Vec<Block> = Vec::new();
    let mut last_line = 0;

    for (line_no, logical) in unfold_lines(text)? {
        last_line = line_no;
        let property = parse_content_line(&logical, line_no)?;

        if property.name == "BEGIN" {
            let name = property.value.trim().to_ascii_uppercase();
            check_nesting(&name, stack.last().map(|b| b.name.as_str()), line_no)?;
            stack.push(Block::new(name, line_no));
        } else if property.name == "END" {
            let name = property.value.trim().to_ascii_uppercase();
            let block = match stack.pop() {
                Some(block) => block,
                None => {
                    return Err(PlannerError::format(
                        line_no,
                        format!("END:{} without a matching BEGIN", name),
                    ))
                }
            };
            if block.name != name {
                return Err(PlannerError::format(
                    line_no,
                    format!(
                        "END:{} does not close BEGIN:{} from line {}",
                        name, block.name, block.line
                    ),
                ));
            }
            match stack.last_mut() {
                Some(parent) => parent.children.push(block),
                None => tree.calendars.push(block),
            }
        } else {
            match stack.last_mut() {
                Some(current) => current.properties.push(property),
                None => {
                    return Err(PlannerError::format(
                        line_no,
                        format!("property {} outside of any calendar block", property.name),
                    ))
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(PlannerError::format(
            open.line,
            format!(
                "BEGIN:{} is never closed (input ends at line {})",
                open.name, last_line
            ),
        ));
    }
    if tree.calendars.is_empty() {
        return Err(PlannerError::format(
            last_line.max(1),
            "no VCALENDAR block found",
        ));
    }

    log::debug!(
        "Read {} calendar block(s), {} event block(s)",
        tree.calendars.len(),
        tree.events().count()
    );
    Ok(tree)
}

fn check_nesting(name: &str, parent: Option<&str>, line: usize) -> AppResult<()> {
    let allowed = match name {
        "VCALENDAR" => parent.is_none(),
        "VEVENT" | "VTODO" | "VJOURNAL" | "VFREEBUSY" | "VTIMEZONE" => parent == Some("VCALENDAR"),
        "VALARM" => matches!(parent, Some("VEVENT") | Some("VTODO")),
        "STANDARD" | "DAYLIGHT" => parent == Some("VTIMEZONE"),
        // Unknown and X- components may live inside any block.
        _ => parent.is_some(),
    };
    if allowed {
        Ok(())
    } else {
        Err(PlannerError::format(
            line,
            match parent {
                Some(p) => format!("BEGIN:{} is not allowed inside {}", name, p),
                None => format!("BEGIN:{} is not allowed at top level", name),
            },
        ))
    }
}

/// Joins folded lines. Yields `(first physical line number, logical line)`.
fn unfold_lines(text: &str) -> AppResult<Vec<(usize, String)>> {
    let mut logical: Vec<(usize, String)> = Vec::new();

    for (idx, raw) in text.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if line.starts_with(' ') || line.starts_with('\t') {
            match logical.last_mut() {
                Some((_, previous)) => previous.push_str(&line[1..]),
                None => {
                    return Err(PlannerError::format(
                        line_no,
                        "continuation line with nothing to continue",
                    ))
                }
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }
        logical.push((line_no, line.to_string()));
    }

    Ok(logical)
}

fn parse_content_line(line: &str, line_no: usize) -> AppResult<Property> {
    let colon = find_unquoted(line, ':').ok_or_else(|| {
        PlannerError::format(line_no, format!("missing ':' in content line {:?}", truncate(line)))
    })?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);

    let mut segments = split_unquoted(head, ';').into_iter();
    let name = segments.next().unwrap_or_default().trim().to_ascii_uppercase();
    if name.is_empty() {
        return Err(PlannerError::format(line_no, "content line has no property name"));
    }

    let mut params = Vec::new();
    for segment in segments {
        // Parameters are carried along but never interpreted here.
        let (key, raw_values) = match segment.split_once('=') {
            Some((k, v)) => (k, v),
            None => (segment, ""),
        };
        let values = split_unquoted(raw_values, ',')
            .into_iter()
            .map(|v| v.trim_matches('"').to_string())
            .collect();
        params.push((key.trim().to_ascii_uppercase(), values));
    }

    Ok(Property {
        name,
        params,
        value: value.to_string(),
        line: line_no,
    })
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            c if c == needle && !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(i) = find_unquoted(rest, sep) {
        parts.push(&rest[..i]);
        rest = &rest[i + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

fn truncate(line: &str) -> String {
    line.chars().take(40).collect()
}
