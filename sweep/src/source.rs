//! Lazy, restartable sequence of item keys read from a paginated collection.

use metrics::counter;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::{debug, warn};

use crate::collection::{Collection, PageRequest};
use crate::error::{ErrorKind, SweepResult};
use crate::metrics::SWEEP_PAGES_LISTED_TOTAL;
use crate::types::ItemKey;
use crate::{bail, sweep_error};

/// Characters left untouched by URL query encoding.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Keys of one listed page, decoded and ready to be enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    pub items: Vec<ItemKey>,
    pub has_more: bool,
}

/// Streams the keys of a [`Collection`] page by page.
///
/// The position of the next request is carried inside the source: the checkpoint for the first
/// request and the continuation token of the previous page afterwards.
#[derive(Debug)]
pub struct ItemSource<C> {
    collection: C,
    next_request: PageRequest,
    exhausted: bool,
}

impl<C> ItemSource<C>
where
    C: Collection,
{
    /// Creates a source listing `collection` strictly after `checkpoint`, or from the start.
    pub fn new(collection: C, checkpoint: Option<ItemKey>) -> Self {
        Self {
            collection,
            next_request: PageRequest {
                start_after: checkpoint,
                continuation_token: None,
            },
            exhausted: false,
        }
    }

    /// Returns `true` once the last page has been returned.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Lists and decodes the next page.
    ///
    /// Entries without a key are skipped. A key that cannot be decoded fails the whole page, so
    /// no key of that page is returned.
    pub async fn next_page(&mut self) -> SweepResult<SourcePage> {
        if self.exhausted {
            bail!(
                ErrorKind::InvalidState,
                "The item source has no pages left"
            );
        }

        let page = self
            .collection
            .list_page(self.next_request.clone())
            .await?;
        counter!(SWEEP_PAGES_LISTED_TOTAL).increment(1);

        let mut items = Vec::with_capacity(page.entries.len());
        for entry in page.entries.iter() {
            let Some(raw_key) = entry.raw_key.as_deref() else {
                warn!("skipping listed entry without a key");
                continue;
            };

            items.push(decode_key(raw_key)?);
        }

        let has_more = page.has_more();
        match page.next_token {
            Some(token) => {
                self.next_request = PageRequest {
                    start_after: None,
                    continuation_token: Some(token),
                };
            }
            None => self.exhausted = true,
        }

        debug!(items = items.len(), has_more, "listed page");

        Ok(SourcePage { items, has_more })
    }
}

/// Decodes a key listed in URL query encoding, where `+` stands for a space.
///
/// Malformed escape sequences and escapes that do not decode to UTF-8 are rejected.
pub fn decode_key(raw_key: &str) -> SweepResult<ItemKey> {
    if let Some(position) = invalid_escape_position(raw_key) {
        bail!(
            ErrorKind::DecodeFailed,
            "Listed key contains an invalid escape sequence",
            format!("raw key '{raw_key}' has an invalid escape at byte {position}")
        );
    }

    let spaced = raw_key.replace('+', " ");
    let decoded = percent_decode_str(&spaced).decode_utf8().map_err(|err| {
        sweep_error!(
            ErrorKind::DecodeFailed,
            "Listed key does not decode to UTF-8",
            format!("raw key: '{raw_key}'"),
            source: err
        )
    })?;

    Ok(ItemKey::new(decoded.into_owned()))
}

/// Encodes a key the way listings with URL encoding return it.
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, QUERY_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

fn invalid_escape_position(raw_key: &str) -> Option<usize> {
    let bytes = raw_key.as_bytes();

    bytes
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'%')
        .map(|(position, _)| position)
        .find(|&position| {
            !matches!(
                bytes.get(position + 1..position + 3),
                Some([high, low]) if high.is_ascii_hexdigit() && low.is_ascii_hexdigit()
            )
        })
}
