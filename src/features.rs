//! Classifier inputs from epoched data.
use ndarray::{Array1, Array2, Array3};

use crate::epoch::Epochs;

/// `(X, y)` for a CSP-style classifier.
///
/// * `X` — `[E, C, T]` epoch data.
/// * `y` — `[E]` class codes, the third column of the epochs' event table.
pub fn extract_csp_features(epochs: &Epochs) -> (Array3<f32>, Array1<i64>) {
    let x = epochs.get_data().clone();
    let y = epochs.events().labels().to_owned();
    (x, y)
}

/// Flatten `[E, C, T]` to `[E, C·T]` (channel-major) for vector classifiers.
pub fn flatten_epochs(x: &Array3<f32>) -> Array2<f32> {
    let (n_e, n_c, n_t) = x.dim();
    Array2::from_shape_fn((n_e, n_c * n_t), |(e, k)| x[[e, k / n_t, k % n_t]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch::create_epoch;
    use crate::events::{create_events_array, EventId};
    use crate::raw::{create_info, ChannelType, RawArray};

    #[test]
    fn labels_follow_kept_events() {
        let info = create_info(vec!["C3".into(), "C4".into()], 100.0, ChannelType::Eeg).unwrap();
        let raw = RawArray::new(Array2::ones((2, 600)), info).unwrap();
        // Last event runs past the end and is dropped.
        let ev = create_events_array(&[0, 100, 550], &[2, 1, 1]).unwrap();
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), 0.0, 3.5).unwrap();

        let (x, y) = extract_csp_features(&ep);
        assert_eq!(x.shape(), &[2, 2, 351]);
        assert_eq!(y.to_vec(), vec![2, 1]);
    }

    #[test]
    fn flatten_is_channel_major() {
        let x = Array3::from_shape_fn((2, 3, 4), |(e, c, t)| (e * 100 + c * 10 + t) as f32);
        let f = flatten_epochs(&x);
        assert_eq!(f.dim(), (2, 12));
        assert_eq!(f[[1, 5]], 111.0);
    }
}
