use calendar_shared::Event;

/// Most matches a search returns.
pub const MAX_RESULTS: usize = 10;

/// Events whose title, description or location contains `query`, ignoring
/// case. A blank query matches nothing.
pub fn search_events<'a>(events: &'a [Event], query: &str) -> Vec<&'a Event> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let contains = |text: Option<&str>| text.is_some_and(|t| t.to_lowercase().contains(&query));

    events
        .iter()
        .filter(|event| {
            contains(Some(&event.title))
                || contains(event.description.as_deref())
                || contains(event.location.as_deref())
        })
        .take(MAX_RESULTS)
        .collect()
}
