// `calculate` transforms: one operator, one numeric operand, applied to the value.

/// Checked in this order; the first operator present decides how the expression splits.
const OPERATORS: [char; 4] = ['*', '/', '+', '-'];

/// Apply `expr` (e.g. `"value * 8"`) to `value`.
///
/// Only `<anything> <op> <number>` is understood. The left side is ignored, the first
/// operator from `* / + -` found in the text is the one used, and it must occur exactly
/// once. Anything else returns `value` unchanged. `value - -1` and `(value + 1) * 2` fall
/// into that case.
pub fn evaluate(value: f64, expr: &str) -> f64 {
    let Some(op) = OPERATORS.iter().copied().find(|op| expr.contains(*op)) else {
        return value;
    };
    let mut parts = expr.split(op);
    let (Some(_), Some(rhs), None) = (parts.next(), parts.next(), parts.next()) else {
        return value;
    };
    let Ok(operand) = rhs.trim().parse::<f64>() else {
        return value;
    };
    match op {
        '*' => value * operand,
        '/' => value / operand,
        '+' => value + operand,
        _ => value - operand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_each_operator() {
        assert_eq!(evaluate(50.0, "value * 2"), 100.0);
        assert_eq!(evaluate(50.0, "value / 4"), 12.5);
        assert_eq!(evaluate(50.0, "value + 0.5"), 50.5);
        assert_eq!(evaluate(50.0, "value - 8"), 42.0);
    }

    #[test]
    fn division_by_zero_is_infinite() {
        assert_eq!(evaluate(10.0, "value / 0"), f64::INFINITY);
        assert!(evaluate(0.0, "value / 0").is_nan());
    }

    #[test]
    fn unknown_expressions_leave_value_unchanged() {
        assert_eq!(evaluate(7.0, ""), 7.0);
        assert_eq!(evaluate(7.0, "value"), 7.0);
        assert_eq!(evaluate(7.0, "value * x"), 7.0);
        assert_eq!(evaluate(7.0, "value ^ 2"), 7.0);
    }

    #[test]
    fn multiple_operators_are_not_supported() {
        // '*' wins the precedence check but occurs twice.
        assert_eq!(evaluate(3.0, "value * 2 * 2"), 3.0);
        // '+' is found first and the right side "1 - 1" does not parse.
        assert_eq!(evaluate(3.0, "value + 1 - 1"), 3.0);
        assert_eq!(evaluate(3.0, "value - -1"), 3.0);
    }

    #[test]
    fn value_is_never_spliced_into_the_text() {
        // The operand is always the right-hand side; the value's own sign plays no part.
        assert_eq!(evaluate(-3.0, "value - 1"), -4.0);
        assert_eq!(evaluate(-3.0, "value * 2"), -6.0);
        // The operand must follow the operator.
        assert_eq!(evaluate(4.0, "2 * value"), 4.0);
    }

    #[test]
    fn signed_operand_after_multiply_parses() {
        assert_eq!(evaluate(3.0, "value * -2"), -6.0);
    }
}
