//! Stable paragraph paths and run IDs
//!
//! - body paragraph: `p{p}`
//! - table paragraph: `t{t}.r{row}.c{cell}.p{p}`
//! - run: `{paragraph_path}:r{run}`

const RUN_SEPARATOR: &str = ":r";

pub fn body_path(paragraph_index: usize) -> String {
    format!("p{}", paragraph_index)
}

pub fn table_path(table: usize, row: usize, cell: usize, paragraph: usize) -> String {
    format!("t{}.r{}.c{}.p{}", table, row, cell, paragraph)
}

pub fn run_id(paragraph_path: &str, run_index: usize) -> String {
    format!("{}{}{}", paragraph_path, RUN_SEPARATOR, run_index)
}

/// Split a run ID into its paragraph path and run index
pub fn split(run_id: &str) -> Option<(&str, usize)> {
    let (path, index) = run_id.rsplit_once(RUN_SEPARATOR)?;
    let index = index.parse().ok()?;
    Some((path, index))
}

/// Paragraph path portion of a run ID
pub fn paragraph_path(run_id: &str) -> &str {
    run_id
        .split_once(RUN_SEPARATOR)
        .map(|(path, _)| path)
        .unwrap_or(run_id)
}

/// True for body paragraph paths (`p3`), false for table paths
pub fn is_body_path(paragraph_path: &str) -> bool {
    paragraph_path.starts_with('p')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_body_and_table_ids() {
        let id = run_id(&body_path(3), 2);
        assert_eq!(id, "p3:r2");
        assert_eq!(split(&id), Some(("p3", 2)));

        let id = run_id(&table_path(0, 1, 2, 0), 4);
        assert_eq!(id, "t0.r1.c2.p0:r4");
        assert_eq!(split(&id), Some(("t0.r1.c2.p0", 4)));
        assert_eq!(paragraph_path(&id), "t0.r1.c2.p0");
    }

    #[test]
    fn test_malformed_ids() {
        assert_eq!(split("p0"), None);
        assert_eq!(split("p0:rx"), None);
        assert_eq!(paragraph_path("p0"), "p0");
    }

    #[test]
    fn test_body_path_detection() {
        assert!(is_body_path("p12"));
        assert!(!is_body_path("t0.r0.c0.p0"));
    }
}
