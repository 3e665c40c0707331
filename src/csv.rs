//! Reading point sets from and writing query answers to comma-separated text.
//!
//! Point files hold one point per row, one coordinate per column. A first row that does not parse
//! as numbers is taken to be a header and skipped, as are blank lines.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{KdIndexError, Result};
use crate::kdtree::Neighbor;

/// Read the points stored in the file at `path`.
pub fn read_points<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    read_points_from(BufReader::new(File::open(path)?))
}

/// Read points from comma-separated rows.
///
/// Every row must have as many columns as the first data row.
pub fn read_points_from<R: BufRead>(reader: R) -> Result<Vec<Vec<f64>>> {
    let mut points: Vec<Vec<f64>> = vec![];
    let mut first_row = true;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = line
            .split(',')
            .map(|field| field.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>();
        let point = match parsed {
            Ok(point) => point,
            Err(_) if first_row => {
                first_row = false;
                continue;
            }
            Err(err) => {
                return Err(KdIndexError::Parse {
                    line: i + 1,
                    message: format!("{:?}: {}", line, err),
                })
            }
        };
        first_row = false;

        if let Some(first) = points.first() {
            if first.len() != point.len() {
                return Err(KdIndexError::Parse {
                    line: i + 1,
                    message: format!("expected {} columns, got {}", first.len(), point.len()),
                });
            }
        }
        points.push(point);
    }

    Ok(points)
}

/// Write one answer row per query to the file at `path`, replacing anything already there.
///
/// See [`write_answers_to`] for the row layout.
pub fn write_answers<Q: AsRef<Path>, P: AsRef<[f64]>>(
    path: Q,
    neighbors: &[Neighbor],
    points: &[P],
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_answers_to(&mut writer, neighbors, points)?;
    writer.flush()?;
    Ok(())
}

/// Write `query_index,point_index,distance,coord_0,...` rows, preceded by a header.
///
/// `neighbors[i]` is the answer to query `i`; the coordinates are those of the matched point,
/// looked up in `points`.
pub fn write_answers_to<W: Write, P: AsRef<[f64]>>(
    mut writer: W,
    neighbors: &[Neighbor],
    points: &[P],
) -> Result<()> {
    let dimensionality = points.first().map_or(0, |p| p.as_ref().len());
    write!(writer, "query_index,point_index,distance")?;
    for axis in 0..dimensionality {
        write!(writer, ",coord_{}", axis)?;
    }
    writeln!(writer)?;

    for (query_index, neighbor) in neighbors.iter().enumerate() {
        let index = neighbor.index as usize;
        let point = points
            .get(index)
            .ok_or(KdIndexError::IndexOutOfRange {
                index,
                len: points.len(),
            })?
            .as_ref();

        write!(
            writer,
            "{},{},{}",
            query_index, neighbor.index, neighbor.distance
        )?;
        for v in point {
            write!(writer, ",{}", v)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_rows() {
        let data = "0,0\n5, 5\n\n9,1.5\n";
        let points = read_points_from(Cursor::new(data)).unwrap();
        assert_eq!(points, vec![vec![0., 0.], vec![5., 5.], vec![9., 1.5]]);
    }

    #[test]
    fn skips_header() {
        let data = "x,y\n1,2\n3,4\n";
        let points = read_points_from(Cursor::new(data)).unwrap();
        assert_eq!(points, vec![vec![1., 2.], vec![3., 4.]]);

        let empty = read_points_from(Cursor::new("")).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn names_bad_line() {
        let data = "1,2\n3,4\n\n5,oops\n";
        assert!(matches!(
            read_points_from(Cursor::new(data)),
            Err(KdIndexError::Parse { line: 4, .. })
        ));

        let ragged = "1,2\n3,4,5\n";
        assert!(matches!(
            read_points_from(Cursor::new(ragged)),
            Err(KdIndexError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn writes_answers() {
        let points = vec![[0., 0.], [5., 5.], [9., 1.]];
        let neighbors = vec![
            Neighbor {
                index: 2,
                distance: 1.5,
            },
            Neighbor {
                index: 0,
                distance: 0.,
            },
        ];

        let mut out = vec![];
        write_answers_to(&mut out, &neighbors, &points).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "query_index,point_index,distance,coord_0,coord_1\n0,2,1.5,9,1\n1,0,0,0,0\n"
        );
    }

    #[test]
    fn answers_replace_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.csv");
        std::fs::write(&path, "stale contents that are much longer than the answers\n".repeat(10))
            .unwrap();

        let points = vec![[1., 2.]];
        let neighbors = vec![Neighbor {
            index: 0,
            distance: 0.,
        }];
        write_answers(&path, &neighbors, &points).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "query_index,point_index,distance,coord_0,coord_1\n0,0,0,1,2\n"
        );
    }
}
