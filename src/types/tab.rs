/// Largest tab count the toolbar badge shows as a number.
pub const MAX_BADGE_COUNT: usize = 50;

/// What the tab-switcher button displays for the current tab count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabBadge {
    Count(usize),
    /// Too many tabs to show a number.
    Overflow,
}

impl TabBadge {
    /// An empty tab list still shows "1": the page on screen counts as a tab.
    pub fn for_count(count: usize) -> Self {
        match count {
            0 => TabBadge::Count(1),
            1..=MAX_BADGE_COUNT => TabBadge::Count(count),
            _ => TabBadge::Overflow,
        }
    }
}
