use crate::state::snapshot::ViewerId;

/// Render layer claimed by `viewer`: its rank among the configured viewer ids,
/// lowest id first. `None` when the viewer is not configured.
pub fn assign_layer(viewer: ViewerId, configured: impl IntoIterator<Item = ViewerId>) -> Option<usize> {
    let mut ids: Vec<ViewerId> = configured.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids.binary_search(&viewer).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_id_takes_layer_zero() {
        let ids = [7, 3, 12];
        assert_eq!(assign_layer(3, ids), Some(0));
        assert_eq!(assign_layer(7, ids), Some(1));
        assert_eq!(assign_layer(12, ids), Some(2));
    }

    #[test]
    fn unconfigured_viewer_has_no_layer() {
        assert_eq!(assign_layer(4, [1, 2]), None);
        assert_eq!(assign_layer(0, []), None);
    }

    #[test]
    fn assignment_is_repeatable() {
        let ids = vec![9, 1, 4, 4];
        let first: Vec<_> = ids.iter().map(|id| assign_layer(*id, ids.clone())).collect();
        let second: Vec<_> = ids.iter().map(|id| assign_layer(*id, ids.clone())).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![Some(2), Some(0), Some(1), Some(1)]);
    }
}
