// src/services/ledger.rs
//
// Cálculo de saldo do fiado. Tudo aqui é puro: recebe movimentos já ordenados
// (data ascendente, empate por created_at e id) e devolve saldos.

use rust_decimal::Decimal;

use crate::models::{
    customer::Customer,
    movement::{Movement, MovementKind},
    statement::{Statement, StatementLine, StatementRange},
};

/// Valor com sinal: COMPRA soma à dívida, ABONO subtrai.
/// É o mesmo delta aplicado ao saldo em cache em `customers.balance`.
pub fn signed_amount(kind: MovementKind, amount: Decimal) -> Decimal {
    match kind {
        MovementKind::Purchase => amount,
        MovementKind::Payment => -amount,
    }
}

pub fn running_balances<I>(entries: I) -> Vec<Decimal>
where
    I: IntoIterator<Item = (MovementKind, Decimal)>,
{
    entries
        .into_iter()
        .scan(Decimal::ZERO, |balance, (kind, amount)| {
            *balance += signed_amount(kind, amount);
            Some(*balance)
        })
        .collect()
}

pub fn final_balance<I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = (MovementKind, Decimal)>,
{
    entries
        .into_iter()
        .fold(Decimal::ZERO, |acc, (kind, amount)| acc + signed_amount(kind, amount))
}

/// Monta o extrato de um cliente. Movimentos antes de `range.from` viram saldo
/// anterior; movimentos depois de `range.to` são ignorados.
pub fn build_statement(customer: Customer, movements: &[Movement], range: StatementRange) -> Statement {
    let mut opening_balance = Decimal::ZERO;
    let mut balance = Decimal::ZERO;
    let mut lines = Vec::new();
    let mut total_purchases = Decimal::ZERO;
    let mut total_payments = Decimal::ZERO;

    for movement in movements {
        if range.to.is_some_and(|to| movement.movement_date > to) {
            continue;
        }

        balance += signed_amount(movement.kind, movement.amount);

        if range.from.is_some_and(|from| movement.movement_date < from) {
            opening_balance = balance;
            continue;
        }

        match movement.kind {
            MovementKind::Purchase => total_purchases += movement.amount,
            MovementKind::Payment => total_payments += movement.amount,
        }

        lines.push(StatementLine {
            movement_id: movement.id,
            date: movement.movement_date,
            description: movement.description.clone(),
            kind: movement.kind,
            amount: movement.amount,
            balance,
        });
    }

    Statement {
        customer,
        range,
        opening_balance,
        lines,
        total_purchases,
        total_payments,
        final_balance: balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            phone: None,
            identification: None,
            cobrador_id: None,
            user_id: None,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    fn movement(date: NaiveDate, kind: MovementKind, cents: i64) -> Movement {
        Movement {
            id: Uuid::new_v4(),
            customer_id: Uuid::nil(),
            movement_date: date,
            description: "Almuerzo".into(),
            kind,
            amount: money(cents),
            recorded_by: None,
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Movement> {
        vec![
            movement(d(2024, 1, 1), MovementKind::Purchase, 10000),
            movement(d(2024, 1, 5), MovementKind::Payment, 4000),
            movement(d(2024, 1, 10), MovementKind::Purchase, 2500),
        ]
    }

    fn entries(movements: &[Movement]) -> Vec<(MovementKind, Decimal)> {
        movements.iter().map(|m| (m.kind, m.amount)).collect()
    }

    #[test]
    fn running_balance_matches_worked_example() {
        let movements = sample();
        assert_eq!(
            running_balances(entries(&movements)),
            vec![money(10000), money(6000), money(8500)]
        );
        assert_eq!(final_balance(entries(&movements)), money(8500));
    }

    #[test]
    fn empty_ledger_has_zero_balance() {
        assert!(running_balances(Vec::new()).is_empty());
        assert_eq!(final_balance(Vec::new()), Decimal::ZERO);

        let statement = build_statement(customer(), &[], StatementRange::default());
        assert!(statement.lines.is_empty());
        assert_eq!(statement.final_balance, Decimal::ZERO);
    }

    #[test]
    fn fold_and_incremental_cache_agree() {
        // Simula o UPDATE customers SET balance = balance + delta de cada insert
        let kinds = [MovementKind::Purchase, MovementKind::Payment];
        let movements: Vec<Movement> = (0..50)
            .map(|i| movement(d(2024, 3, 1), kinds[(i * 7 % 3 == 0) as usize], 1 + i * 137))
            .collect();

        let mut cached = Decimal::ZERO;
        for m in &movements {
            cached += signed_amount(m.kind, m.amount);
        }

        let fold = final_balance(entries(&movements));
        let expected: Decimal = movements
            .iter()
            .map(|m| match m.kind {
                MovementKind::Purchase => m.amount,
                MovementKind::Payment => -m.amount,
            })
            .sum();

        assert_eq!(fold, cached);
        assert_eq!(fold, expected);
        assert_eq!(running_balances(entries(&movements)).last().copied(), Some(fold));
    }

    #[test]
    fn cents_do_not_drift() {
        let movements: Vec<Movement> = (0..1000)
            .map(|_| movement(d(2024, 1, 1), MovementKind::Purchase, 10))
            .collect();
        assert_eq!(final_balance(entries(&movements)), money(10000));
    }

    #[test]
    fn statement_carries_running_balances_and_totals() {
        let statement = build_statement(customer(), &sample(), StatementRange::default());

        let balances: Vec<Decimal> = statement.lines.iter().map(|l| l.balance).collect();
        assert_eq!(balances, vec![money(10000), money(6000), money(8500)]);
        assert_eq!(statement.opening_balance, Decimal::ZERO);
        assert_eq!(statement.total_purchases, money(12500));
        assert_eq!(statement.total_payments, money(4000));
        assert_eq!(statement.final_balance, money(8500));
    }

    #[test]
    fn range_splits_opening_balance_and_cuts_at_end() {
        let range = StatementRange { from: Some(d(2024, 1, 3)), to: Some(d(2024, 1, 6)) };
        let statement = build_statement(customer(), &sample(), range);

        assert_eq!(statement.opening_balance, money(10000));
        assert_eq!(statement.lines.len(), 1);
        assert_eq!(statement.lines[0].balance, money(6000));
        assert_eq!(statement.final_balance, money(6000));

        // Mesmo saldo final de um extrato sem início cortado no mesmo dia
        let until = StatementRange { from: None, to: Some(d(2024, 1, 6)) };
        assert_eq!(build_statement(customer(), &sample(), until).final_balance, money(6000));
    }
}
