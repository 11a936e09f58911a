/// Median of a sample set; the mean of the two middle values for even sizes.
///
/// Non-finite values are ignored. Returns `None` for an empty set.
pub fn median_f32(values: &[f32]) -> Option<f32> {
    let mut v: Vec<f32> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f32::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        Some(v[mid])
    } else {
        Some(0.5 * (v[mid - 1] + v[mid]))
    }
}

pub fn mean_u8(values: &[u8]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    Some(sum as f32 / values.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_odd_and_even_sizes() {
        assert_eq!(median_f32(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median_f32(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median_f32(&[f32::NAN, 7.0]), Some(7.0));
        assert_eq!(median_f32(&[]), None);
    }

    #[test]
    fn mean_of_bytes() {
        assert_eq!(mean_u8(&[0, 255]), Some(127.5));
        assert_eq!(mean_u8(&[]), None);
    }
}
