//! CSV export of per-point loads from a calculated order.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::order::Order;
use crate::participants::Participant;

/// Exports the per-point results of `order` to a CSV file at the given path.
///
/// Columns: `point`, `demand`, one column per producer key in merit order,
/// `price_setter` and `price`. Points without a price setter leave the last
/// two columns empty. Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `order` - A calculated order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(order: &Order, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(order, buf)
}

/// Writes the per-point results of `order` as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(order: &Order, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let producers = order.producers();

    let mut header = vec!["point".to_string(), "demand".to_string()];
    header.extend(producers.iter().map(|p| p.key().to_string()));
    header.push("price_setter".to_string());
    header.push("price".to_string());
    wtr.write_record(&header)?;

    for point in 0..order.points() {
        let mut row = Vec::with_capacity(header.len());
        row.push(point.to_string());
        row.push(format!("{:.4}", order.demand_at(point)));
        row.extend(producers.iter().map(|p| format!("{:.4}", p.load_at(point))));
        row.push(
            order
                .price_setting_at(point)
                .map(ToString::to_string)
                .unwrap_or_default(),
        );
        row.push(
            order
                .price_at(point)
                .map(|price| format!("{price:.4}"))
                .unwrap_or_default(),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::Calculator;
    use crate::curve::Curve;
    use crate::participants::{Capacity, Dispatchable, User};

    fn calculated() -> Order {
        let mut order = Order::with_points(3);
        order
            .add_producer(Dispatchable::new("coal", Capacity::new(1.0, 1.0, 1.0), 14.0))
            .add_producer(Dispatchable::new("gas", Capacity::new(1.0, 1.0, 1.0), 16.0))
            .add_user(User::with_curve("city", Curve::new(vec![0.5, 1.5, 3.0])));
        order.calculate(&Calculator::new()).unwrap();
        order
    }

    fn written(order: &Order) -> String {
        let mut buf = Vec::new();
        write_csv(order, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_lists_producers_in_merit_order() {
        let output = written(&calculated());
        assert_eq!(
            output.lines().next(),
            Some("point,demand,coal,gas,price_setter,price")
        );
    }

    #[test]
    fn one_row_per_point() {
        let output = written(&calculated());
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn unpriced_points_leave_columns_empty() {
        let output = written(&calculated());
        let rows: Vec<&str> = output.lines().collect();
        assert_eq!(rows[2], "1,1.5000,1.0000,0.5000,gas,16.0000");
        assert_eq!(rows[3], "2,3.0000,1.0000,1.0000,,");
    }

    #[test]
    fn output_parses_back() {
        let output = written(&calculated());
        let mut rdr = csv::ReaderBuilder::new().from_reader(output.as_bytes());
        assert_eq!(rdr.headers().map(csv::StringRecord::len).ok(), Some(6));

        let mut count = 0;
        for record in rdr.records() {
            let record = record.unwrap();
            for i in 1..4 {
                assert!(record[i].parse::<f64>().is_ok(), "column {i} should be numeric");
            }
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn deterministic_output() {
        let order = calculated();
        assert_eq!(written(&order), written(&order));
    }
}
