//! Parser pour les tables de métriques CSV

use serde::Serialize;
use tracing::debug;

use crate::types::MetricRecord;
use crate::ParseError;

/// Colonnes obligatoires de l'en-tête
pub const REQUIRED_COLUMNS: [&str; 3] = ["id", "revenue", "cost"];

/// Cellule numérique non convertible (ligne conservée, valeur NaN)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoercionWarning {
    /// Numéro de ligne dans le texte source (1 = en-tête)
    pub line: u64,
    pub column: &'static str,
    pub raw: String,
}

/// Résultat du parsing d'une table
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    /// Une entrée par ligne de données, dans l'ordre du texte
    pub records: Vec<MetricRecord>,

    /// Conversions numériques échouées (non fatales)
    pub warnings: Vec<CoercionWarning>,
}

/// Index des colonnes obligatoires dans l'en-tête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    id: usize,
    revenue: usize,
    cost: usize,
}

/// Parse une table CSV (séparateur virgule, sans guillemets, en-tête obligatoire).
///
/// Les colonnes `id`, `revenue` et `cost` sont lues par leur position dans
/// l'en-tête, dans n'importe quel ordre; les autres colonnes sont ignorées.
/// Les lignes vides sont sautées.
///
/// # Errors
///
/// - `ParseError::EmptyTable` si moins de 2 lignes non vides
/// - `ParseError::MissingColumns` si l'en-tête ne contient pas les 3 colonnes
pub fn parse(content: &str) -> Result<ParsedTable, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ParseError::malformed(e.to_string()))?;
        if row.len() == 1 && row[0].is_empty() {
            continue;
        }
        rows.push(row);
    }

    if rows.len() < 2 {
        return Err(ParseError::EmptyTable);
    }

    let layout = column_layout(&rows[0])?;

    let mut table = ParsedTable {
        records: Vec::with_capacity(rows.len() - 1),
        warnings: Vec::new(),
    };

    for row in &rows[1..] {
        let line = row.position().map_or(0, csv::Position::line);
        let id = row.get(layout.id).unwrap_or("").to_string();
        if id.is_empty() {
            // Ligne conservée mais jamais joignable
            debug!(line, "Row without id");
            table.warnings.push(CoercionWarning {
                line,
                column: "id",
                raw: String::new(),
            });
        }
        let revenue = coerce(row.get(layout.revenue), line, "revenue", &mut table.warnings);
        let cost = coerce(row.get(layout.cost), line, "cost", &mut table.warnings);

        table.records.push(MetricRecord { id, revenue, cost });
    }

    debug!(
        records = table.records.len(),
        coercion_failures = table.warnings.len(),
        "Table parsed"
    );

    Ok(table)
}

/// Trouve les colonnes obligatoires; liste celles qui manquent
fn column_layout(header: &csv::StringRecord) -> Result<ColumnLayout, ParseError> {
    let position = |name: &str| header.iter().position(|cell| cell == name);

    match (position("id"), position("revenue"), position("cost")) {
        (Some(id), Some(revenue), Some(cost)) => Ok(ColumnLayout { id, revenue, cost }),
        _ => {
            let missing = REQUIRED_COLUMNS
                .iter()
                .filter(|&&name| position(name).is_none())
                .map(|name| name.to_string())
                .collect();
            Err(ParseError::MissingColumns(missing))
        }
    }
}

/// Convertit une cellule en f64; NaN (et un warning) si impossible
fn coerce(
    cell: Option<&str>,
    line: u64,
    column: &'static str,
    warnings: &mut Vec<CoercionWarning>,
) -> f64 {
    let raw = cell.unwrap_or("");
    match fast_float::parse::<f64, _>(raw) {
        Ok(value) => value,
        Err(_) => {
            debug!(line, column, raw, "Non-numeric cell, using NaN");
            warnings.push(CoercionWarning {
                line,
                column,
                raw: raw.to_string(),
            });
            f64::NAN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let table = parse("id,revenue,cost\nS1,100,40\nS2,200,150").unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(
            table.records[0],
            MetricRecord {
                id: "S1".to_string(),
                revenue: 100.0,
                cost: 40.0
            }
        );
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let table = parse("cost, region ,id,revenue\r\n5,north, A1 ,7.5\r\n").unwrap();
        assert_eq!(table.records.len(), 1);
        let record = &table.records[0];
        assert_eq!(record.id, "A1");
        assert_eq!(record.revenue, 7.5);
        assert_eq!(record.cost, 5.0);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = parse("\nid,revenue,cost\n\nA,1,2\n\n\nB,3,4\n").unwrap();
        let ids: Vec<_> = table.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_coercion_failure_is_not_fatal() {
        let table = parse("id,revenue,cost\nA,n/a,2\nB,3").unwrap();
        assert_eq!(table.records.len(), 2);
        assert!(table.records[0].revenue.is_nan());
        assert_eq!(table.records[0].cost, 2.0);
        // Cellule manquante
        assert!(table.records[1].cost.is_nan());

        assert_eq!(table.warnings.len(), 2);
        assert_eq!(
            table.warnings[0],
            CoercionWarning {
                line: 2,
                column: "revenue",
                raw: "n/a".to_string()
            }
        );
        assert_eq!(table.warnings[1].line, 3);
    }

    #[test]
    fn test_row_without_id_is_kept_with_warning() {
        let table = parse("id,revenue,cost\n,1,2\nA,3,4\n").unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].id, "");
        assert_eq!(table.records[0].revenue, 1.0);
        assert_eq!(
            table.warnings,
            vec![CoercionWarning {
                line: 2,
                column: "id",
                raw: String::new(),
            }]
        );
    }

    #[test]
    fn test_header_only_is_empty_table() {
        assert_eq!(parse("id,revenue,cost").unwrap_err(), ParseError::EmptyTable);
        assert_eq!(parse("id,revenue,cost\n\n").unwrap_err(), ParseError::EmptyTable);
        assert_eq!(parse("").unwrap_err(), ParseError::EmptyTable);
    }

    #[test]
    fn test_missing_columns() {
        assert_eq!(
            parse("name,value\na,1").unwrap_err(),
            ParseError::MissingColumns(vec![
                "id".to_string(),
                "revenue".to_string(),
                "cost".to_string()
            ])
        );
        assert_eq!(
            parse("id,Revenue,cost\na,1,2").unwrap_err(),
            ParseError::MissingColumns(vec!["revenue".to_string()])
        );
    }

    #[test]
    fn test_quotes_are_not_special() {
        let table = parse("id,revenue,cost\n\"A\",1,2").unwrap();
        assert_eq!(table.records[0].id, "\"A\"");
    }
}
