//! Console rendering of tracks, events and snapshots

use cadence_core::TrackMetadata;
use cadence_playback::{PlayerEvent, PlayerSnapshot};

/// `m:ss`
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One line per track: name, artist and length
pub fn describe_track(track: &TrackMetadata) -> String {
    let artist = track.primary_artist().unwrap_or("Unknown artist");
    let album = track
        .album
        .as_ref()
        .map(|album| format!(" ({})", album.name))
        .unwrap_or_default();
    format!(
        "{} · {}{} [{}]",
        track.name,
        artist,
        album,
        format_clock(track.display_duration_secs())
    )
}

/// Printable line for an event; state chatter is left to the logs
pub fn describe_event(event: &PlayerEvent, snapshot: &PlayerSnapshot) -> Option<String> {
    match event {
        PlayerEvent::TrackChanged { track_id, .. } => Some(match &snapshot.current_track {
            Some(track) if &track.id == track_id => format!("> {}", describe_track(track)),
            _ => format!("> {track_id}"),
        }),
        PlayerEvent::EndOfQueue => Some("End of queue".to_string()),
        PlayerEvent::QueueExhausted => Some("No playable track left in queue".to_string()),
        PlayerEvent::DeviceReady { device_id } => Some(format!("Device ready ({device_id})")),
        PlayerEvent::DeviceOffline { device_id } => Some(format!("Device offline ({device_id})")),
        PlayerEvent::Error { message } => Some(format!("! {message}")),
        PlayerEvent::StateChanged { .. } | PlayerEvent::TrackEnded { .. } => None,
    }
}

/// Status line summarizing a snapshot
pub fn describe_snapshot(snapshot: &PlayerSnapshot) -> String {
    let now = snapshot
        .current_track
        .as_ref()
        .map_or_else(|| "nothing loaded".to_string(), describe_track);
    let position = snapshot.current_index.map_or_else(
        || "-".to_string(),
        |index| format!("{}/{}", index + 1, snapshot.queue.len()),
    );

    format!(
        "{:?} | {} | {} @ {} | shuffle {} | repeat {} | up next {}",
        snapshot.state,
        now,
        position,
        format_clock(snapshot.transport.progress_secs as u64),
        if snapshot.transport.shuffle { "on" } else { "off" },
        snapshot.transport.repeat_mode,
        snapshot.up_next.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::TrackId;

    fn track() -> TrackMetadata {
        TrackMetadata::new("7", "Clair de Lune")
            .with_artist("a1", "Debussy")
            .with_album("al1", "Suite bergamasque", None)
            .with_duration_ms(301_000)
    }

    #[test]
    fn clock_pads_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn track_line_uses_display_duration() {
        assert_eq!(
            describe_track(&track()),
            "Clair de Lune · Debussy (Suite bergamasque) [5:00]"
        );
    }

    #[test]
    fn track_change_prints_resolved_metadata() {
        let snapshot = PlayerSnapshot {
            current_track: Some(track()),
            ..PlayerSnapshot::default()
        };
        let event = PlayerEvent::TrackChanged {
            track_id: TrackId::from(7u64),
            previous_track_id: None,
        };

        assert_eq!(
            describe_event(&event, &snapshot).unwrap(),
            "> Clair de Lune · Debussy (Suite bergamasque) [5:00]"
        );
        assert!(describe_event(&PlayerEvent::EndOfQueue, &snapshot).is_some());
        assert!(describe_event(
            &PlayerEvent::TrackEnded {
                track_id: TrackId::from(7u64)
            },
            &snapshot
        )
        .is_none());
    }

    #[test]
    fn empty_snapshot_summary() {
        let line = describe_snapshot(&PlayerSnapshot::default());
        assert!(line.starts_with("Idle | nothing loaded | - @ 0:00"));
    }
}
