//! Switch targets

use tandem_protocol::PrivateMirror;

/// Roster indices the player may switch to: bench members that are not
/// fainted and have HP left.
pub fn switch_targets(mirror: &PrivateMirror) -> Vec<usize> {
    mirror
        .bench()
        .filter(|(_, member)| member.is_alive())
        .map(|(idx, _)| idx)
        .collect()
}
