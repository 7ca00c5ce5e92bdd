use crate::parser::fields::string_list;
use crate::parser::Record;
use crate::types::ScopeBoundaries;

/// Boundaries from a decoded object; absent keys become empty lists
pub fn boundaries_from_record(record: &Record) -> ScopeBoundaries {
    ScopeBoundaries {
        in_scope: string_list(record.get("in_scope").or_else(|| record.get("in-scope"))),
        out_of_scope: string_list(
            record
                .get("out_of_scope")
                .or_else(|| record.get("out-of-scope")),
        ),
        unclear: string_list(record.get("unclear")),
    }
}

#[derive(Clone, Copy)]
enum Heading {
    InScope,
    OutOfScope,
    Unclear,
}

fn heading(line: &str) -> Option<Heading> {
    let lower = line.to_lowercase();
    if lower.contains("out-of-scope") || lower.contains("out of scope") {
        Some(Heading::OutOfScope)
    } else if lower.contains("in-scope") || lower.contains("in scope") {
        Some(Heading::InScope)
    } else if lower.contains("unclear") || lower.contains("ambiguous") {
        Some(Heading::Unclear)
    } else {
        None
    }
}

/// Bullet items collected under in-scope / out-of-scope / unclear headings
pub fn heuristic_boundaries(text: &str) -> ScopeBoundaries {
    let mut boundaries = ScopeBoundaries::default();
    let mut current = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // "**In Scope**" is a heading, "* item" is a bullet
        let bullet = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
            .or_else(|| line.strip_prefix('•'));

        match bullet {
            Some(item) => {
                let item = item.trim().trim_matches('*').trim();
                if item.is_empty() {
                    continue;
                }
                let list = match current {
                    Some(Heading::InScope) => &mut boundaries.in_scope,
                    Some(Heading::OutOfScope) => &mut boundaries.out_of_scope,
                    Some(Heading::Unclear) => &mut boundaries.unclear,
                    None => continue,
                };
                list.push(item.to_string());
            }
            None => {
                if let Some(h) = heading(line) {
                    current = Some(h);
                }
            }
        }
    }

    boundaries
}
