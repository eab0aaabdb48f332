use crate::models::MajorMinor;
use crate::tables::Bucket;

/// Label of the bucket containing `version`, searching oldest bucket first.
///
/// Versions outside every bucket return `None` and drop out of bucketed totals.
pub fn consolidate(version: MajorMinor, buckets: &[Bucket]) -> Option<MajorMinor> {
    buckets
        .iter()
        .find(|bucket| bucket.contains(version))
        .map(Bucket::label)
}

/// Buckets in publication order (newest first).
pub fn publication_order(buckets: &[Bucket]) -> impl Iterator<Item = &Bucket> {
    buckets.iter().rev()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::GLIBC_BUCKETS;

    #[test]
    fn test_every_member_maps_to_its_label() {
        for bucket in &GLIBC_BUCKETS {
            for member in bucket.members {
                assert_eq!(consolidate(*member, &GLIBC_BUCKETS), Some(bucket.label()));
            }
        }
    }

    #[test]
    fn test_examples() {
        let c = |minor| consolidate(MajorMinor::new(2, minor), &GLIBC_BUCKETS);
        assert_eq!(c(13), Some(MajorMinor::new(2, 12)));
        assert_eq!(c(18), Some(MajorMinor::new(2, 17)));
        assert_eq!(c(30), Some(MajorMinor::new(2, 28)));
        assert_eq!(c(4), None);
        assert_eq!(c(37), None);
        assert_eq!(consolidate(MajorMinor::UNKNOWN, &GLIBC_BUCKETS), None);
    }

    #[test]
    fn test_publication_order_newest_first() {
        let keys: Vec<String> = publication_order(&GLIBC_BUCKETS).map(|b| b.to_string()).collect();
        assert_eq!(keys.first().map(String::as_str), Some("2.35"));
        assert_eq!(keys.last().map(String::as_str), Some("2.5"));
        assert_eq!(keys.len(), GLIBC_BUCKETS.len());
    }
}
