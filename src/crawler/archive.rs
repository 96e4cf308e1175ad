//! Archive writer
//!
//! Turns extracted article fields into an archive record and retires the
//! frontier entry it came from. The archive write always happens first: if
//! the process dies between the two steps, the entry is simply archived
//! again on the next run instead of being lost.

use crate::crawler::selectors::ExtractedArticle;
use crate::storage::{FrontierEntry, NewArchiveRecord, Storage, StorageResult};

/// Builds the archive record for a frontier entry
pub fn build_record(entry: &FrontierEntry, article: ExtractedArticle) -> NewArchiveRecord {
    NewArchiveRecord {
        target_id: entry.target_id,
        url: entry.url.clone(),
        title: article.title,
        body: article.body,
        article_updated_at: article.updated_at,
    }
}

/// Stores the article, then retires its frontier entry
///
/// Returns the archive ID. If the store fails, the entry is left queued. If
/// the retire fails, the record is kept and the entry stays queued as well.
pub fn archive_and_retire<S: Storage>(
    storage: &mut S,
    entry: &FrontierEntry,
    article: ExtractedArticle,
) -> StorageResult<i64> {
    let record = build_record(entry, article);
    let archive_id = storage.store_article(&record)?;
    storage.retire(entry.id)?;

    tracing::debug!(url = %entry.url, archive_id, "Archived article");
    Ok(archive_id)
}

/// Retires a queued URL without archiving it
///
/// Returns false when the URL is not queued for the target.
pub fn skip_url<S: Storage>(storage: &mut S, target_id: i64, url: &str) -> StorageResult<bool> {
    match storage.find_entry(target_id, url)? {
        Some(entry) => {
            storage.retire(entry.id)?;
            tracing::info!("Dropped {} from the frontier", url);
            Ok(true)
        }
        None => Ok(false),
    }
}
