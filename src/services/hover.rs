//! Hover Engine

use tracing::debug;

use crate::error::QueryError;
use crate::models::completion::HoverResult;
use crate::models::position::Position;
use crate::services::facts::TypeFacts;
use crate::services::program::Program;
use crate::services::resolver;

/// `name: type` for the identifier at `position`, followed by its
/// documentation. `None` when the position is not on an identifier.
pub fn hover(
    program: &Program,
    facts: &dyn TypeFacts,
    uri: &str,
    position: Position,
) -> Result<Option<HoverResult>, QueryError> {
    let cursor = resolver::locate(program, uri, position)?;
    let tree = cursor.file.tree();
    if !tree.kind(cursor.node).is_identifier() {
        return Ok(None);
    }

    let name = tree.text(cursor.node);
    let display_text = match facts.symbol_at(program, uri, cursor.node) {
        None => name.to_string(),
        Some(symbol) => {
            let mut text = match facts.type_of(program, symbol) {
                Ok(ty) => format!("{}: {}", name, ty),
                Err(e) => {
                    debug!("Hover without type for {}: {}", name, e);
                    name.to_string()
                }
            };
            if let Ok(Some(doc)) = facts.doc_comment(program, symbol) {
                text.push_str("\n\n");
                text.push_str(&doc);
            }
            text
        }
    };

    Ok(Some(HoverResult {
        display_text,
        range: cursor.file.parsed.range_of(cursor.node),
    }))
}
