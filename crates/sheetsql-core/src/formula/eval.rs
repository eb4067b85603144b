//! Expression evaluation

use std::cmp::Ordering;

use sheetsql_model::{Cell, CellRange, CellRef, ErrorCode, Formula, Workbook};
use tracing::debug;

use super::parser::{parse, BinaryOp, Expr, UnaryOp};
use super::{EvalError, FormulaEvaluator};
use crate::config::FormulaMode;

/// Evaluates the common spreadsheet formula subset
///
/// ```rust
/// use sheetsql_core::config::FormulaMode;
/// use sheetsql_core::formula::{ExpressionEvaluator, FormulaEvaluator};
/// use sheetsql_model::{Cell, CellRef, Formula, Row, Sheet, Workbook};
///
/// let sheet =
///     Sheet::new("Sheet1").with_row(Row::from_cells([Cell::number(2.0), Cell::number(3.0)]));
/// let workbook = Workbook::new().with_sheet(sheet);
/// let evaluator = ExpressionEvaluator::new(FormulaMode::Recalculate);
///
/// let result = evaluator
///     .resolve(&workbook, "Sheet1", CellRef::new(0, 2), &Formula::new("=SUM(A1:B1)*2"))
///     .unwrap();
/// assert_eq!(result, Cell::number(10.0));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator {
    mode: FormulaMode,
}

impl ExpressionEvaluator {
    /// Create an evaluator; the mode also applies to formulas reached through references
    pub fn new(mode: FormulaMode) -> Self {
        Self { mode }
    }

    /// The resolution strategy
    pub fn mode(&self) -> FormulaMode {
        self.mode
    }
}

impl FormulaEvaluator for ExpressionEvaluator {
    fn resolve(
        &self,
        workbook: &Workbook,
        sheet: &str,
        at: CellRef,
        formula: &Formula,
    ) -> Result<Cell, EvalError> {
        let mut evaluation = Evaluation {
            workbook,
            mode: self.mode,
            stack: Vec::new(),
        };
        evaluation.resolve_formula(sheet, at, formula)
    }
}

/// Intermediate value during evaluation
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorCode),
    Blank,
}

impl Scalar {
    fn from_cell(cell: &Cell) -> Self {
        match cell {
            Cell::Boolean(b) => Scalar::Boolean(*b),
            Cell::Numeric { value, .. } => Scalar::Number(*value),
            Cell::Text(s) => Scalar::Text(s.clone()),
            Cell::Error(code) => Scalar::Error(*code),
            Cell::Blank | Cell::Formula(_) => Scalar::Blank,
        }
    }

    fn into_cell(self) -> Cell {
        match self {
            Scalar::Number(n) if n.is_finite() => Cell::number(n),
            Scalar::Number(_) => Cell::Error(ErrorCode::Num),
            Scalar::Text(s) => Cell::Text(s),
            Scalar::Boolean(b) => Cell::Boolean(b),
            Scalar::Error(code) => Cell::Error(code),
            Scalar::Blank => Cell::number(0.0),
        }
    }
}

/// A function argument before it is reduced to a value
enum Arg {
    Value(Scalar),
    Reference(Scalar),
    Range(Vec<Scalar>),
}

type Outcome<T> = std::result::Result<T, ErrorCode>;

fn to_number(value: &Scalar) -> Outcome<f64> {
    match value {
        Scalar::Number(n) => Ok(*n),
        Scalar::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Scalar::Blank => Ok(0.0),
        Scalar::Text(s) => s.trim().parse::<f64>().map_err(|_| ErrorCode::Value),
        Scalar::Error(code) => Err(*code),
    }
}

fn to_text(value: &Scalar) -> Outcome<String> {
    match value {
        Scalar::Number(n) => Ok(n.to_string()),
        Scalar::Boolean(true) => Ok("TRUE".to_string()),
        Scalar::Boolean(false) => Ok("FALSE".to_string()),
        Scalar::Blank => Ok(String::new()),
        Scalar::Text(s) => Ok(s.clone()),
        Scalar::Error(code) => Err(*code),
    }
}

fn to_bool(value: &Scalar) -> Outcome<bool> {
    match value {
        Scalar::Boolean(b) => Ok(*b),
        Scalar::Number(n) => Ok(*n != 0.0),
        Scalar::Blank => Ok(false),
        Scalar::Text(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
        Scalar::Text(s) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
        Scalar::Text(_) => Err(ErrorCode::Value),
        Scalar::Error(code) => Err(*code),
    }
}

fn finish(outcome: Outcome<Scalar>) -> Scalar {
    outcome.unwrap_or_else(Scalar::Error)
}

/// Ordering across types: numbers < text < booleans, text case-insensitive
fn compare(left: &Scalar, right: &Scalar) -> Outcome<Ordering> {
    fn blank_as(other: &Scalar) -> Scalar {
        match other {
            Scalar::Text(_) => Scalar::Text(String::new()),
            Scalar::Boolean(_) => Scalar::Boolean(false),
            _ => Scalar::Number(0.0),
        }
    }
    fn rank(value: &Scalar) -> u8 {
        match value {
            Scalar::Text(_) => 1,
            Scalar::Boolean(_) => 2,
            _ => 0,
        }
    }

    if let Scalar::Error(code) = left {
        return Err(*code);
    }
    if let Scalar::Error(code) = right {
        return Err(*code);
    }

    let left = if *left == Scalar::Blank { blank_as(right) } else { left.clone() };
    let right = if *right == Scalar::Blank { blank_as(&left) } else { right.clone() };

    Ok(match (&left, &right) {
        (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Scalar::Text(a), Scalar::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Scalar::Boolean(a), Scalar::Boolean(b)) => a.cmp(b),
        (a, b) => rank(a).cmp(&rank(b)),
    })
}

fn arithmetic(left: &Scalar, right: &Scalar, f: fn(f64, f64) -> Outcome<f64>) -> Outcome<Scalar> {
    let a = to_number(left)?;
    let b = to_number(right)?;
    let n = f(a, b)?;
    if n.is_finite() {
        Ok(Scalar::Number(n))
    } else {
        Err(ErrorCode::Num)
    }
}

fn concat(left: &Scalar, right: &Scalar) -> Outcome<Scalar> {
    Ok(Scalar::Text(to_text(left)? + &to_text(right)?))
}

fn binary(op: BinaryOp, left: &Scalar, right: &Scalar) -> Scalar {
    let comparison = |test: fn(Ordering) -> bool| -> Scalar {
        finish(compare(left, right).map(|ord| Scalar::Boolean(test(ord))))
    };

    match op {
        BinaryOp::Add => finish(arithmetic(left, right, |a, b| Ok(a + b))),
        BinaryOp::Sub => finish(arithmetic(left, right, |a, b| Ok(a - b))),
        BinaryOp::Mul => finish(arithmetic(left, right, |a, b| Ok(a * b))),
        BinaryOp::Div => finish(arithmetic(left, right, |a, b| {
            if b == 0.0 {
                Err(ErrorCode::Div0)
            } else {
                Ok(a / b)
            }
        })),
        BinaryOp::Pow => finish(arithmetic(left, right, |a, b| {
            if a == 0.0 && b == 0.0 {
                Err(ErrorCode::Num)
            } else if a == 0.0 && b < 0.0 {
                Err(ErrorCode::Div0)
            } else {
                Ok(a.powf(b))
            }
        })),
        BinaryOp::Concat => finish(concat(left, right)),
        BinaryOp::Eq => comparison(|o| o == Ordering::Equal),
        BinaryOp::Ne => comparison(|o| o != Ordering::Equal),
        BinaryOp::Lt => comparison(|o| o == Ordering::Less),
        BinaryOp::Gt => comparison(|o| o == Ordering::Greater),
        BinaryOp::Le => comparison(|o| o != Ordering::Greater),
        BinaryOp::Ge => comparison(|o| o != Ordering::Less),
    }
}

fn check_arity(name: &str, args: &[Expr], min: usize, max: Option<usize>) -> Result<(), EvalError> {
    let count = args.len();
    if count < min || max.is_some_and(|max| count > max) {
        return Err(EvalError::Arity(name.to_string()));
    }
    Ok(())
}

fn single(arg: &Arg) -> Scalar {
    match arg {
        Arg::Value(value) | Arg::Reference(value) => value.clone(),
        Arg::Range(_) => Scalar::Error(ErrorCode::Value),
    }
}

/// Numbers an aggregate sees: direct values are converted, cells must already be numeric
fn numbers(args: &[Arg]) -> Outcome<Vec<f64>> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Arg::Value(Scalar::Blank) => {}
            Arg::Value(value) => out.push(to_number(value)?),
            Arg::Reference(value) => collect_number(value, &mut out)?,
            Arg::Range(values) => {
                for value in values {
                    collect_number(value, &mut out)?;
                }
            }
        }
    }
    Ok(out)
}

fn collect_number(value: &Scalar, out: &mut Vec<f64>) -> Outcome<()> {
    match value {
        Scalar::Number(n) => out.push(*n),
        Scalar::Error(code) => return Err(*code),
        _ => {}
    }
    Ok(())
}

fn booleans(args: &[Arg]) -> Outcome<Vec<bool>> {
    let mut out = Vec::new();
    let mut cell = |value: &Scalar| -> Outcome<()> {
        match value {
            Scalar::Boolean(b) => out.push(*b),
            Scalar::Number(n) => out.push(*n != 0.0),
            Scalar::Error(code) => return Err(*code),
            Scalar::Text(_) | Scalar::Blank => {}
        }
        Ok(())
    };
    let mut direct = Vec::new();
    for arg in args {
        match arg {
            Arg::Value(Scalar::Blank) => {}
            Arg::Value(value) => direct.push(to_bool(value)?),
            Arg::Reference(value) => cell(value)?,
            Arg::Range(values) => {
                for value in values {
                    cell(value)?;
                }
            }
        }
    }
    out.extend(direct);
    Ok(out)
}

/// Every value an argument list holds, flagged when passed directly
fn cells(args: &[Arg]) -> Vec<(bool, &Scalar)> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Arg::Value(value) => out.push((true, value)),
            Arg::Reference(value) => out.push((false, value)),
            Arg::Range(values) => out.extend(values.iter().map(|v| (false, v))),
        }
    }
    out
}

fn round(value: f64, digits: f64) -> f64 {
    let digits = digits.trunc() as i32;
    if digits >= 0 {
        let factor = 10f64.powi(digits);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-digits);
        (value / factor).round() * factor
    }
}

/// One top-level resolution with its reference stack
struct Evaluation<'a> {
    workbook: &'a Workbook,
    mode: FormulaMode,
    stack: Vec<(String, CellRef)>,
}

impl<'a> Evaluation<'a> {
    fn resolve_formula(
        &mut self,
        sheet: &str,
        at: CellRef,
        formula: &Formula,
    ) -> Result<Cell, EvalError> {
        let cached = formula.cached_value().filter(|cell| !cell.is_formula());
        match (self.mode, cached) {
            (FormulaMode::Cached, Some(cached)) => Ok(cached.clone()),
            (FormulaMode::Cached, None) => self.evaluate_formula(sheet, at, formula),
            (FormulaMode::Recalculate, cached) => {
                match self.evaluate_formula(sheet, at, formula) {
                    Ok(cell) => Ok(cell),
                    Err(err) => match cached {
                        Some(cached) => {
                            debug!("Using cached value for {}!{}: {}", sheet, at, err);
                            Ok(cached.clone())
                        }
                        None => Err(err),
                    },
                }
            }
        }
    }

    fn evaluate_formula(
        &mut self,
        sheet: &str,
        at: CellRef,
        formula: &Formula,
    ) -> Result<Cell, EvalError> {
        let key = (sheet.to_lowercase(), at);
        if self.stack.contains(&key) {
            return Err(EvalError::Cycle(format!("{}!{}", sheet, at)));
        }

        let expr = parse(&formula.expression)?;
        self.stack.push(key);
        let result = self.eval(sheet, &expr);
        self.stack.pop();
        Ok(result?.into_cell())
    }

    fn cell_value(&mut self, sheet: &str, at: CellRef) -> Result<Scalar, EvalError> {
        let workbook = self.workbook;
        let Some(target) = workbook.sheet(sheet) else {
            return Ok(Scalar::Error(ErrorCode::Ref));
        };
        match target.cell(at) {
            None => Ok(Scalar::Blank),
            Some(Cell::Formula(formula)) => {
                let resolved = self.resolve_formula(&target.name, at, formula)?;
                Ok(Scalar::from_cell(&resolved))
            }
            Some(cell) => Ok(Scalar::from_cell(cell)),
        }
    }

    /// Stored cells inside a range; blanks are left out
    fn range_values(&mut self, sheet: &str, range: CellRange) -> Result<Vec<Scalar>, EvalError> {
        let workbook = self.workbook;
        let Some(target) = workbook.sheet(sheet) else {
            return Ok(vec![Scalar::Error(ErrorCode::Ref)]);
        };

        let mut values = Vec::new();
        for (row_index, row) in target.rows() {
            if row_index < range.start.row || row_index > range.end.row {
                continue;
            }
            for (&col, _) in row.cells.range(range.start.col..=range.end.col) {
                values.push(self.cell_value(&target.name, CellRef::new(row_index, col))?);
            }
        }
        Ok(values)
    }

    fn eval(&mut self, sheet: &str, expr: &Expr) -> Result<Scalar, EvalError> {
        Ok(match expr {
            Expr::Number(n) => Scalar::Number(*n),
            Expr::Text(s) => Scalar::Text(s.clone()),
            Expr::Boolean(b) => Scalar::Boolean(*b),
            Expr::Error(code) => Scalar::Error(*code),
            Expr::Reference { sheet: target, at } => {
                self.cell_value(target.as_deref().unwrap_or(sheet), *at)?
            }
            Expr::Range { .. } => Scalar::Error(ErrorCode::Value),
            Expr::Unary { op, expr } => {
                let value = self.eval(sheet, expr)?;
                finish(to_number(&value).map(|n| match op {
                    UnaryOp::Plus => Scalar::Number(n),
                    UnaryOp::Minus => Scalar::Number(-n),
                }))
            }
            Expr::Percent(expr) => {
                let value = self.eval(sheet, expr)?;
                finish(to_number(&value).map(|n| Scalar::Number(n / 100.0)))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(sheet, left)?;
                let right = self.eval(sheet, right)?;
                binary(*op, &left, &right)
            }
            Expr::Call { name, args } => self.call(sheet, name, args)?,
        })
    }

    fn eval_arg(&mut self, sheet: &str, expr: &Expr) -> Result<Arg, EvalError> {
        Ok(match expr {
            Expr::Reference { sheet: target, at } => {
                Arg::Reference(self.cell_value(target.as_deref().unwrap_or(sheet), *at)?)
            }
            Expr::Range {
                sheet: target,
                range,
            } => Arg::Range(self.range_values(target.as_deref().unwrap_or(sheet), *range)?),
            other => Arg::Value(self.eval(sheet, other)?),
        })
    }

    fn call(&mut self, sheet: &str, name: &str, args: &[Expr]) -> Result<Scalar, EvalError> {
        if name == "IF" {
            check_arity(name, args, 2, Some(3))?;
            let condition = self.eval(sheet, &args[0])?;
            return match to_bool(&condition) {
                Err(code) => Ok(Scalar::Error(code)),
                Ok(true) => self.eval(sheet, &args[1]),
                Ok(false) => match args.get(2) {
                    Some(otherwise) => self.eval(sheet, otherwise),
                    None => Ok(Scalar::Boolean(false)),
                },
            };
        }

        match name {
            "SUM" | "AVERAGE" | "MIN" | "MAX" | "COUNT" | "COUNTA" | "AND" | "OR"
            | "CONCATENATE" => check_arity(name, args, 1, None)?,
            "NOT" | "ABS" | "LEN" | "UPPER" | "LOWER" => check_arity(name, args, 1, Some(1))?,
            "ROUND" => check_arity(name, args, 2, Some(2))?,
            other => return Err(EvalError::UnknownFunction(other.to_string())),
        }

        let values = args
            .iter()
            .map(|arg| self.eval_arg(sheet, arg))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(finish(apply(name, &values)))
    }
}

fn apply(name: &str, args: &[Arg]) -> Outcome<Scalar> {
    let number = |n: f64| Ok(Scalar::Number(n));
    match name {
        "SUM" => number(numbers(args)?.iter().sum()),
        "AVERAGE" => {
            let values = numbers(args)?;
            if values.is_empty() {
                return Err(ErrorCode::Div0);
            }
            number(values.iter().sum::<f64>() / values.len() as f64)
        }
        "MIN" => number(numbers(args)?.into_iter().reduce(f64::min).unwrap_or(0.0)),
        "MAX" => number(numbers(args)?.into_iter().reduce(f64::max).unwrap_or(0.0)),
        "COUNT" => {
            let count = cells(args)
                .into_iter()
                .filter(|(direct, value)| match value {
                    Scalar::Number(_) => true,
                    Scalar::Boolean(_) => *direct,
                    Scalar::Text(s) => *direct && s.trim().parse::<f64>().is_ok(),
                    _ => false,
                })
                .count();
            number(count as f64)
        }
        "COUNTA" => number(
            cells(args)
                .into_iter()
                .filter(|(_, v)| **v != Scalar::Blank)
                .count() as f64,
        ),
        "AND" | "OR" => {
            let values = booleans(args)?;
            if values.is_empty() {
                return Err(ErrorCode::Value);
            }
            let result = if name == "AND" {
                values.iter().all(|b| *b)
            } else {
                values.iter().any(|b| *b)
            };
            Ok(Scalar::Boolean(result))
        }
        "NOT" => Ok(Scalar::Boolean(!to_bool(&single(&args[0]))?)),
        "ABS" => number(to_number(&single(&args[0]))?.abs()),
        "ROUND" => {
            let value = to_number(&single(&args[0]))?;
            let digits = to_number(&single(&args[1]))?;
            number(round(value, digits))
        }
        "LEN" => number(to_text(&single(&args[0]))?.chars().count() as f64),
        "UPPER" => Ok(Scalar::Text(to_text(&single(&args[0]))?.to_uppercase())),
        "LOWER" => Ok(Scalar::Text(to_text(&single(&args[0]))?.to_lowercase())),
        "CONCATENATE" => {
            let mut text = String::new();
            for (_, value) in cells(args) {
                text.push_str(&to_text(value)?);
            }
            Ok(Scalar::Text(text))
        }
        _ => Err(ErrorCode::Name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsql_model::{Row, Sheet};

    fn workbook() -> Workbook {
        let data = Sheet::new("Data")
            .with_row(Row::from_cells([
                Cell::number(10.0),
                Cell::number(20.0),
                Cell::text("x"),
            ]))
            .with_row(Row::from_cells([
                Cell::number(5.0),
                Cell::Boolean(true),
                Cell::text("Hello"),
            ]))
            .with_row(Row::from_cells([
                Cell::formula("A1+A2"),
                Cell::formula_with_result("B1*2", Cell::number(99.0)),
                Cell::formula("UPPER(C1)"),
            ]));
        let other = Sheet::new("My Sheet").with_row(Row::from_cells([Cell::number(7.0)]));
        Workbook::new().with_sheet(data).with_sheet(other)
    }

    fn eval_with(mode: FormulaMode, formula: &str) -> Result<Cell, EvalError> {
        ExpressionEvaluator::new(mode).resolve(
            &workbook(),
            "Data",
            CellRef::new(9, 9),
            &Formula::new(formula),
        )
    }

    fn eval(formula: &str) -> Cell {
        eval_with(FormulaMode::Recalculate, formula).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1+2*3"), Cell::number(7.0));
        assert_eq!(eval("(1+2)*3"), Cell::number(9.0));
        assert_eq!(eval("-2^2"), Cell::number(4.0));
        assert_eq!(eval("2^3^2"), Cell::number(64.0));
        assert_eq!(eval("50%"), Cell::number(0.5));
        assert_eq!(eval("A1/A2"), Cell::number(2.0));
        assert_eq!(eval("\"3\"+1"), Cell::number(4.0));
    }

    #[test]
    fn test_spreadsheet_errors_are_values() {
        assert_eq!(eval("1/0"), Cell::Error(ErrorCode::Div0));
        assert_eq!(eval("C1+1"), Cell::Error(ErrorCode::Value));
        assert_eq!(eval("#N/A*2"), Cell::Error(ErrorCode::NA));
        assert_eq!(eval("Missing!A1"), Cell::Error(ErrorCode::Ref));
    }

    #[test]
    fn test_text_and_comparison() {
        assert_eq!(eval("C2&\" \"&A2"), Cell::text("Hello 5"));
        assert_eq!(eval("\"abc\"=\"ABC\""), Cell::Boolean(true));
        assert_eq!(eval("A1>A2"), Cell::Boolean(true));
        assert_eq!(eval("\"a\"<1"), Cell::Boolean(false));
        assert_eq!(eval("Z99=0"), Cell::Boolean(true));
        assert_eq!(eval("B2=TRUE"), Cell::Boolean(true));
    }

    #[test]
    fn test_references_across_sheets() {
        assert_eq!(eval("'My Sheet'!A1*2"), Cell::number(14.0));
        assert_eq!(eval("Z99"), Cell::number(0.0));
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(eval("SUM(A1:C2)"), Cell::number(35.0));
        assert_eq!(eval("SUM(A1, 1, TRUE)"), Cell::number(12.0));
        assert_eq!(eval("AVERAGE(A1:A2)"), Cell::number(7.5));
        assert_eq!(eval("MIN(A1:B2)"), Cell::number(5.0));
        assert_eq!(eval("MAX(A1:B2, 100)"), Cell::number(100.0));
        assert_eq!(eval("COUNT(A1:C2)"), Cell::number(3.0));
        assert_eq!(eval("COUNTA(A1:C2)"), Cell::number(6.0));
        assert_eq!(eval("AVERAGE(C1:C2)"), Cell::Error(ErrorCode::Div0));
        assert_eq!(eval("MAX(C1:C2)"), Cell::number(0.0));
    }

    #[test]
    fn test_logical_functions() {
        assert_eq!(eval("IF(A1>A2, \"big\", \"small\")"), Cell::text("big"));
        assert_eq!(eval("IF(FALSE, 1)"), Cell::Boolean(false));
        assert_eq!(eval("IF(TRUE, 1, 1/0)"), Cell::number(1.0));
        assert_eq!(eval("AND(TRUE, A1)"), Cell::Boolean(true));
        assert_eq!(eval("OR(FALSE, 0)"), Cell::Boolean(false));
        assert_eq!(eval("NOT(B2)"), Cell::Boolean(false));
        assert_eq!(eval("AND(C1:C2)"), Cell::Error(ErrorCode::Value));
    }

    #[test]
    fn test_math_and_text_functions() {
        assert_eq!(eval("ABS(-3.5)"), Cell::number(3.5));
        assert_eq!(eval("ROUND(3.14159, 2)"), Cell::number(3.14));
        assert_eq!(eval("ROUND(1250, -2)"), Cell::number(1300.0));
        assert_eq!(eval("ROUND(-2.5, 0)"), Cell::number(-3.0));
        assert_eq!(eval("LEN(C2)"), Cell::number(5.0));
        assert_eq!(eval("UPPER(\"abc\")"), Cell::text("ABC"));
        assert_eq!(eval("LOWER(C2)"), Cell::text("hello"));
        assert_eq!(eval("CONCATENATE(C2, \"-\", A1:B1)"), Cell::text("Hello-1020"));
        assert_eq!(eval("LEN(A1:A2)"), Cell::Error(ErrorCode::Value));
    }

    #[test]
    fn test_nested_formulas_follow_mode() {
        // B3 caches 99 but evaluates to 40
        assert_eq!(eval_with(FormulaMode::Cached, "B3").unwrap(), Cell::number(99.0));
        assert_eq!(eval_with(FormulaMode::Recalculate, "B3").unwrap(), Cell::number(40.0));
        assert_eq!(eval("A3*2"), Cell::number(30.0));
    }

    #[test]
    fn test_cached_mode_prefers_stored_result() {
        let workbook = workbook();
        let formula = Formula::new("1/0").with_cached(Cell::number(1.0));
        let cached = ExpressionEvaluator::new(FormulaMode::Cached)
            .resolve(&workbook, "Data", CellRef::new(5, 0), &formula)
            .unwrap();
        assert_eq!(cached, Cell::number(1.0));
        let recalculated = ExpressionEvaluator::new(FormulaMode::Recalculate)
            .resolve(&workbook, "Data", CellRef::new(5, 0), &formula)
            .unwrap();
        assert_eq!(recalculated, Cell::Error(ErrorCode::Div0));
    }

    #[test]
    fn test_recalculate_falls_back_to_cache_on_failure() {
        let formula = Formula::new("NOSUCH(1)").with_cached(Cell::text("old"));
        let cell = ExpressionEvaluator::new(FormulaMode::Recalculate)
            .resolve(&workbook(), "Data", CellRef::new(5, 0), &formula)
            .unwrap();
        assert_eq!(cell, Cell::text("old"));
    }

    #[test]
    fn test_evaluation_failures() {
        assert!(matches!(
            eval_with(FormulaMode::Cached, "NOSUCH(1)"),
            Err(EvalError::UnknownFunction(name)) if name == "NOSUCH"
        ));
        assert!(matches!(eval_with(FormulaMode::Cached, "1+"), Err(EvalError::Syntax { .. })));
        assert!(matches!(eval_with(FormulaMode::Cached, "ROUND(1)"), Err(EvalError::Arity(_))));
    }

    #[test]
    fn test_cycles_are_detected() {
        let sheet = Sheet::new("S").with_row(Row::from_cells([
            Cell::formula("B1+1"),
            Cell::formula("A1+1"),
        ]));
        let workbook = Workbook::new().with_sheet(sheet);
        let result = ExpressionEvaluator::new(FormulaMode::Cached).resolve(
            &workbook,
            "S",
            CellRef::new(0, 0),
            &Formula::new("B1+1"),
        );
        assert!(matches!(result, Err(EvalError::Cycle(_))));
    }
}
