use crate::models::{Cell, Dataset, Report};
use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load a whole report from JSON: `{metric: dataset}` or
/// `{metric: {category: dataset}}`, datasets in split orientation.
pub fn load_report_json<P: AsRef<Path>>(path: P) -> Result<Report> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let report: Report = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing report {}", path.display()))?;
    info!(
        "loaded {} metric(s) from {}",
        report.metrics().count(),
        path.display()
    );
    Ok(report)
}

/// Load one dataset from a delimited file. `.tsv` files are tab separated,
/// everything else comma separated. Empty cells read as null.
pub fn load_dataset_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let columns: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if columns.is_empty() {
        bail!("{} has no header row", path.display());
    }
    let mut data = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("reading record {} of {}", i + 1, path.display()))?;
        data.push(rec.iter().map(Cell::parse).collect());
    }
    debug!("read {} rows x {} columns from {}", data.len(), columns.len(), path.display());
    Ok(Dataset::new(columns, data))
}

/// Load a report from `.json`, or wrap a single `.csv`/`.tsv` dataset as a
/// one-metric report named after the file stem.
pub fn load_report<P: AsRef<Path>>(path: P) -> Result<Report> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_report_json(path),
        _ => {
            let metric = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("metric");
            Ok(Report::single(metric, load_dataset_csv(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_csv_with_nulls() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("shannon.csv");
        fs::write(&p, "sample-id,depth,median\nS1,10,1.5\nS2,10,\n").unwrap();
        let ds = load_dataset_csv(&p).unwrap();
        assert_eq!(ds.columns, vec!["sample-id", "depth", "median"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cell(0, 2).as_f64(), Some(1.5));
        assert_eq!(ds.cell(1, 2), &Cell::Null);
    }

    #[test]
    fn tsv_uses_tabs_and_stem_names_metric() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("faith_pd.tsv");
        fs::write(&p, "sample-id\tdepth\tmedian\nS1\t10\t2\n").unwrap();
        let report = load_report(&p).unwrap();
        assert_eq!(report.metrics().collect::<Vec<_>>(), vec!["faith_pd"]);
        let ds = report.dataset("faith_pd", None).unwrap();
        assert_eq!(ds.cell(0, 1).as_f64(), Some(10.0));
    }

    #[test]
    fn reads_category_split_json() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("report.json");
        fs::write(
            &p,
            r#"{"shannon":{"body-site":{"columns":["body-site","depth","median"],"data":[["gut",10,3.0]]}}}"#,
        )
        .unwrap();
        let report = load_report(&p).unwrap();
        assert_eq!(report.categories("shannon"), vec!["body-site"]);
    }

    #[test]
    fn bad_json_reports_path() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("broken.json");
        fs::write(&p, "{not json").unwrap();
        let err = load_report_json(&p).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
