
use futures::future::join_all;
use itertools::Itertools;
use tracing::{debug, warn};

use crate::store::{DocumentLookup, QueryMatch};

/// Substituted for the context block when retrieval found nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No relevant context was found for this query.";

/// Builds the context block handed to the response generator.
///
/// Document names are resolved concurrently, one lookup per match, but
/// snippets are emitted in match order so the strongest result leads.
/// A failed lookup degrades that snippet to a raw id label rather than
/// failing the whole assembly.
pub async fn assemble_context(matches: &[QueryMatch], lookup: &dyn DocumentLookup) -> String {
    if matches.is_empty() {
        return NO_CONTEXT_PLACEHOLDER.to_string();
    }

    debug!("Assembling context from {} matches", matches.len());

    let labels = join_all(
        matches
            .iter()
            .map(|m| resolve_label(m.document_id, lookup)),
    )
    .await;

    matches
        .iter()
        .zip(labels)
        .map(|(m, label)| format!("{label}: {}", m.content))
        .join("\n\n")
}

async fn resolve_label(document_id: i64, lookup: &dyn DocumentLookup) -> String {
    match lookup.get_document(document_id).await {
        Ok(document) => format!("From document \"{}\"", document.name),
        Err(e) => {
            warn!(
                "Could not resolve document {} while assembling context: {}",
                document_id, e
            );
            format!("From document {document_id}")
        }
    }
}
