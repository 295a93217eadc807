// src/services/customer_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, format::clean_opt},
    db::{CustomerRepository, MovementRepository, UserRepository},
    models::{
        auth::{Role, User},
        customer::{CreateCustomerForm, Customer, CustomerScope, CustomerSummary},
        statement::{Statement, StatementRange},
    },
    services::ledger,
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    movement_repo: MovementRepository,
    user_repo: UserRepository,
}

impl CustomerService {
    pub fn new(
        repo: CustomerRepository,
        movement_repo: MovementRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self { repo, movement_repo, user_repo }
    }

    pub async fn list(&self, user: &User, search: Option<&str>) -> Result<Vec<CustomerSummary>, AppError> {
        self.repo.list_summaries(CustomerScope::for_user(user), search).await
    }

    pub async fn create(&self, actor: &User, form: CreateCustomerForm) -> Result<Customer, AppError> {
        if !actor.role.can_manage_customers() {
            return Err(AppError::Forbidden);
        }

        let name = form.name.trim();
        if name.is_empty() {
            return Err(AppError::MissingCustomer);
        }

        // Cobrador só cria clientes na própria carteira
        let cobrador_id = match (actor.role, clean_opt(&form.cobrador)) {
            (Role::Cobrador, _) => Some(actor.id),
            (_, None) => None,
            (_, Some(username)) => Some(self.resolve_cobrador(&username).await?),
        };

        let user_id = match clean_opt(&form.client_login) {
            None => None,
            Some(username) => Some(self.resolve_client_login(&username).await?),
        };

        let customer = self
            .repo
            .create(
                self.user_repo.pool(),
                name,
                clean_opt(&form.phone).as_deref(),
                clean_opt(&form.identification).as_deref(),
                cobrador_id,
                user_id,
            )
            .await?;

        tracing::info!("📇 Cliente '{}' criado por '{}'", customer.name, actor.username);
        Ok(customer)
    }

    /// Busca o cliente respeitando a visibilidade do usuário.
    pub async fn get_visible(&self, user: &User, customer_id: Uuid) -> Result<Customer, AppError> {
        let customer = self
            .repo
            .find_by_id(customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        if !CustomerScope::for_user(user).allows(&customer) {
            tracing::warn!(
                "'{}' tentou acessar o cliente {} fora da sua carteira",
                user.username,
                customer_id
            );
            return Err(AppError::Forbidden);
        }
        Ok(customer)
    }

    /// Extrato recalculado a partir dos movimentos.
    pub async fn statement(
        &self,
        user: &User,
        customer_id: Uuid,
        range: StatementRange,
    ) -> Result<Statement, AppError> {
        let customer = self.get_visible(user, customer_id).await?;
        let movements = self.movement_repo.list_for_customer(customer.id, range.to).await?;

        let cached_balance = customer.balance;
        let statement = ledger::build_statement(customer, &movements, range);

        // Só dá para comparar com o cache quando o extrato vai até o fim
        if range.to.is_none() && statement.final_balance != cached_balance {
            tracing::warn!(
                "Saldo em cache do cliente {} ({}) difere do recalculado ({})",
                customer_id,
                cached_balance,
                statement.final_balance
            );
        }

        Ok(statement)
    }

    async fn resolve_cobrador(&self, username: &str) -> Result<Uuid, AppError> {
        self.user_repo
            .find_by_username(username)
            .await?
            .filter(|u| u.active && u.role != Role::Cliente)
            .map(|u| u.id)
            .ok_or_else(|| AppError::UnknownCobrador(username.to_string()))
    }

    async fn resolve_client_login(&self, username: &str) -> Result<Uuid, AppError> {
        self.user_repo
            .find_by_username(username)
            .await?
            .filter(|u| u.role == Role::Cliente)
            .map(|u| u.id)
            .ok_or_else(|| AppError::UnknownClientLogin(username.to_string()))
    }
}
