//! Per-provider pagination rules.
//!
//! Every upstream defines pagination differently: Brave takes a
//! page-granularity offset, Google a 1-indexed item offset, Marginalia a
//! 0-indexed item offset — and Brave and Google additionally refuse to
//! serve past roughly the first hundred results. Each quirk is encoded
//! once here as a [`PagingRule`] so adapters share one tested translation
//! instead of repeating the arithmetic.

/// How a provider translates a 1-indexed page into its native offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetRule {
    /// Page-granularity offset: `offset = page - 1`.
    PageIndex,
    /// 1-indexed item offset: `start = (page - 1) * page_size + 1`.
    ItemStart,
    /// 0-indexed item offset: `index = (page - 1) * page_size`.
    ItemIndex,
}

/// A provider's pagination contract: offset formula plus hard ceiling.
#[derive(Debug, Clone, Copy)]
pub struct PagingRule {
    pub offset: OffsetRule,
    /// Highest offset value the provider will serve, or `None` when the
    /// provider imposes no client-visible ceiling.
    pub max_offset: Option<u32>,
}

/// Brave web search: `offset = page - 1`, refuses offsets above 9.
pub const BRAVE_WEB: PagingRule = PagingRule {
    offset: OffsetRule::PageIndex,
    max_offset: Some(9),
};

/// Google Custom Search: `start = (page-1)*size + 1`, refuses starts above 91.
pub const GOOGLE_WEB: PagingRule = PagingRule {
    offset: OffsetRule::ItemStart,
    max_offset: Some(91),
};

/// Marginalia: `index = (page-1)*size`, no ceiling enforced on our side.
pub const MARGINALIA_WEB: PagingRule = PagingRule {
    offset: OffsetRule::ItemIndex,
    max_offset: None,
};

/// Brave image search: page-granularity offset, three pages deep.
pub const BRAVE_IMAGES: PagingRule = PagingRule {
    offset: OffsetRule::PageIndex,
    max_offset: Some(2),
};

/// Google image search: same item-start window as web search.
pub const GOOGLE_IMAGES: PagingRule = PagingRule {
    offset: OffsetRule::ItemStart,
    max_offset: Some(91),
};

impl PagingRule {
    /// The provider-native offset for a 1-indexed `page`.
    ///
    /// `page` arrives straight from the request, so item-offset arithmetic
    /// saturates at `u32::MAX` instead of overflowing. A saturated offset
    /// lies past every ceiling, so absurd pages exhaust rather than wrap
    /// back into the servable window.
    pub fn offset_for(&self, page: u32, page_size: u32) -> u32 {
        let pages_before = page.max(1) - 1;
        match self.offset {
            OffsetRule::PageIndex => pages_before,
            OffsetRule::ItemStart => pages_before
                .checked_mul(page_size)
                .and_then(|items| items.checked_add(1))
                .unwrap_or(u32::MAX),
            OffsetRule::ItemIndex => pages_before.checked_mul(page_size).unwrap_or(u32::MAX),
        }
    }

    /// True when the requested page lies beyond the provider's ceiling.
    /// Adapters must answer with an empty response and no network call.
    pub fn exhausted(&self, page: u32, page_size: u32) -> bool {
        match self.max_offset {
            Some(max) => self.offset_for(page, page_size) > max,
            None => false,
        }
    }

    /// True when at least one more offset exists strictly below the
    /// ceiling. Feeds provider `hasMore` predicates: a page ending exactly
    /// at the ceiling must not invite a request for a page known empty.
    pub fn within_ceiling(&self, offset: u32) -> bool {
        match self.max_offset {
            Some(max) => offset < max,
            None => true,
        }
    }
}
