// src/services/movement_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, MovementRepository},
    models::{
        auth::{Role, User},
        customer::{Customer, CustomerScope},
        movement::{Movement, MovementListRow, MovementQuery, NewMovement, Page, PAGE_SIZE},
    },
    services::ledger::signed_amount,
};

/// Resultado de um lançamento: o movimento, o cliente e o saldo em cache atualizado.
#[derive(Debug)]
pub struct RecordedMovement {
    pub movement: Movement,
    pub customer: Customer,
    pub balance: Decimal,
}

#[derive(Clone)]
pub struct MovementService {
    repo: MovementRepository,
    customer_repo: CustomerRepository,
    pool: PgPool,
}

impl MovementService {
    pub fn new(repo: MovementRepository, customer_repo: CustomerRepository, pool: PgPool) -> Self {
        Self { repo, customer_repo, pool }
    }

    /// Registra o movimento e atualiza o saldo em cache na mesma transação.
    /// Se o cliente ainda não existe, ele é criado.
    pub async fn record(&self, actor: &User, new_movement: NewMovement) -> Result<RecordedMovement, AppError> {
        if !actor.role.can_record_movements() {
            return Err(AppError::Forbidden);
        }

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let customer = self
            .customer_repo
            .find_or_create_by_name(&mut *tx, &new_movement.customer_name, new_customer_wallet(actor))
            .await?;

        // Cobrador não lança em cliente de outra carteira (o drop do tx faz rollback)
        if !CustomerScope::for_user(actor).allows(&customer) {
            tracing::warn!(
                "'{}' tentou lançar no cliente '{}' de outra carteira",
                actor.username,
                customer.name
            );
            return Err(AppError::Forbidden);
        }

        let movement = self
            .repo
            .insert(&mut *tx, customer.id, &new_movement, Some(actor.id))
            .await?;

        let balance = self
            .customer_repo
            .apply_balance_delta(
                &mut *tx,
                customer.id,
                signed_amount(movement.kind, movement.amount),
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(
            "💰 {} de {} para '{}' lançado por '{}' (saldo {})",
            movement.kind.label(),
            movement.amount,
            customer.name,
            actor.username,
            balance
        );

        Ok(RecordedMovement { movement, customer, balance })
    }

    /// Listagem paginada com busca pelo nome do cliente.
    pub async fn list(
        &self,
        user: &User,
        query: &MovementQuery,
    ) -> Result<(Vec<MovementListRow>, Page), AppError> {
        let scope = CustomerScope::for_user(user);
        let search = query.search();

        let total = self.repo.count(scope, search).await?;
        let page = Page::new(query.page, PAGE_SIZE, total);
        let rows = self.repo.search(scope, search, page.limit(), page.offset()).await?;

        Ok((rows, page))
    }
}

// Cliente criado no lançamento cai na carteira do cobrador, como no formulário
fn new_customer_wallet(actor: &User) -> Option<Uuid> {
    (actor.role == Role::Cobrador).then_some(actor.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::UserRepository,
        models::{
            customer::CreateCustomerForm, movement::MovementKind,
            statement::StatementRange,
        },
        services::customer_service::CustomerService,
    };
    use chrono::{NaiveDate, Utc};

    fn actor(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "u".into(),
            password_hash: String::new(),
            role,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_cobradores_give_new_customers_a_wallet() {
        let cobrador = actor(Role::Cobrador);
        assert_eq!(new_customer_wallet(&cobrador), Some(cobrador.id));
        assert_eq!(new_customer_wallet(&actor(Role::Admin)), None);
        assert_eq!(new_customer_wallet(&actor(Role::User)), None);
    }

    fn new_movement(customer: &str, day: u32, kind: MovementKind, cents: i64) -> NewMovement {
        NewMovement {
            customer_name: customer.into(),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            description: "Almuerzo".into(),
            kind,
            amount: Decimal::new(cents, 2),
        }
    }

    fn services(pool: &PgPool) -> (UserRepository, MovementService, CustomerService) {
        let users = UserRepository::new(pool.clone());
        let movements = MovementService::new(
            MovementRepository::new(pool.clone()),
            CustomerRepository::new(pool.clone()),
            pool.clone(),
        );
        let customers = CustomerService::new(
            CustomerRepository::new(pool.clone()),
            MovementRepository::new(pool.clone()),
            users.clone(),
        );
        (users, movements, customers)
    }

    #[sqlx::test]
    #[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
    async fn cached_balance_matches_statement(pool: PgPool) {
        let (users, movements, customers) = services(&pool);
        let cobrador = users.create_user(&pool, "cobra", "x", Role::Cobrador).await.unwrap();

        movements.record(&cobrador, new_movement("Ana", 1, MovementKind::Purchase, 10000)).await.unwrap();
        movements.record(&cobrador, new_movement("Ana", 2, MovementKind::Payment, 4000)).await.unwrap();
        let last = movements
            .record(&cobrador, new_movement("Ana", 3, MovementKind::Purchase, 2500))
            .await
            .unwrap();
        assert_eq!(last.balance, Decimal::new(8500, 2));

        let statement = customers
            .statement(&cobrador, last.customer.id, StatementRange::default())
            .await
            .unwrap();
        let balances: Vec<Decimal> = statement.lines.iter().map(|l| l.balance).collect();
        assert_eq!(balances, [Decimal::new(10000, 2), Decimal::new(6000, 2), Decimal::new(8500, 2)]);
        assert_eq!(statement.final_balance, last.balance);
    }

    #[sqlx::test]
    #[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
    async fn recording_respects_roles_and_wallets(pool: PgPool) {
        let (users, movements, customers) = services(&pool);
        let cliente = users.create_user(&pool, "cli", "x", Role::Cliente).await.unwrap();
        let cobrador_a = users.create_user(&pool, "cobra-a", "x", Role::Cobrador).await.unwrap();
        let cobrador_b = users.create_user(&pool, "cobra-b", "x", Role::Cobrador).await.unwrap();

        let result = movements.record(&cliente, new_movement("Ana", 1, MovementKind::Purchase, 500)).await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        let form = CreateCustomerForm {
            name: "Beto".into(),
            phone: String::new(),
            identification: String::new(),
            cobrador: String::new(),
            client_login: String::new(),
        };
        let beto = customers.create(&cobrador_a, form).await.unwrap();
        assert_eq!(beto.cobrador_id, Some(cobrador_a.id));

        let result = movements.record(&cobrador_b, new_movement("Beto", 1, MovementKind::Purchase, 500)).await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        // O rollback não deixou movimento nem saldo
        let beto = customers.get_visible(&cobrador_a, beto.id).await.unwrap();
        assert_eq!(beto.balance, Decimal::ZERO);
        assert!(matches!(
            customers.get_visible(&cobrador_b, beto.id).await,
            Err(AppError::Forbidden)
        ));
    }

    #[sqlx::test]
    #[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
    async fn implicit_customer_lands_in_the_cobrador_wallet(pool: PgPool) {
        let (users, movements, customers) = services(&pool);
        let cobrador_a = users.create_user(&pool, "cobra-a", "x", Role::Cobrador).await.unwrap();
        let cobrador_b = users.create_user(&pool, "cobra-b", "x", Role::Cobrador).await.unwrap();

        let recorded = movements
            .record(&cobrador_a, new_movement("Carla", 1, MovementKind::Purchase, 1500))
            .await
            .unwrap();
        assert_eq!(recorded.customer.cobrador_id, Some(cobrador_a.id));
        assert!(matches!(
            customers.get_visible(&cobrador_b, recorded.customer.id).await,
            Err(AppError::Forbidden)
        ));
    }

    #[sqlx::test]
    #[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
    async fn search_treats_wildcards_literally(pool: PgPool) {
        let (users, movements, customers) = services(&pool);
        let admin = users.create_user(&pool, "root", "x", Role::Admin).await.unwrap();
        movements.record(&admin, new_movement("Ana", 1, MovementKind::Purchase, 100)).await.unwrap();
        movements.record(&admin, new_movement("Beto", 1, MovementKind::Purchase, 100)).await.unwrap();

        assert!(customers.list(&admin, Some("_")).await.unwrap().is_empty());
        assert!(customers.list(&admin, Some("%")).await.unwrap().is_empty());

        let found = customers.list(&admin, Some("aN")).await.unwrap();
        assert_eq!(found.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["Ana"]);

        let query = MovementQuery { q: Some("_".into()), page: None };
        let (rows, page) = movements.list(&admin, &query).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(page.total_items, 0);
    }
}
