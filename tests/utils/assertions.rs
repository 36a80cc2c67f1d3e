use huddle::room::RoomSummary;
use huddle::websockets::ServerEvent;

// ============================================================================
// Assertion helpers
// ============================================================================

/// All room-list payloads a connection received, oldest first
pub fn room_lists(events: &[ServerEvent]) -> Vec<Vec<RoomSummary>> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::RoomList(summaries) => Some(summaries.clone()),
            _ => None,
        })
        .collect()
}

/// The most recent room-list a connection received; panics if none arrived
pub fn last_room_list(events: &[ServerEvent]) -> Vec<RoomSummary> {
    room_lists(events)
        .pop()
        .expect("expected at least one room-list event")
}

pub fn count_matching(events: &[ServerEvent], pred: impl Fn(&ServerEvent) -> bool) -> usize {
    events.iter().filter(|event| pred(event)).count()
}
