// src/services/lifecycle_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, serial::normalize_serial_number},
    db::{
        AssetRepository, ClientRepository, EmployeeRepository, LifecycleRepository,
        lifecycle_repo::{NewConnection, NewRelocation},
    },
    models::{
        asset::{Asset, AssetStatus, NewAsset},
        auth::Session,
        client::Client,
        lifecycle::{
            AmountPayload, ClientHistory, ClosePayload, ConnectPayload, LifecycleAction,
            RelocatePayload, TransitionOutcome, clean,
        },
    },
};

const RELOCATED_ASSET_TYPE: &str = "Router";

fn normalized_serial(raw: &str) -> Result<String, AppError> {
    let serial = normalize_serial_number(raw);
    if serial.is_empty() {
        return Err(AppError::BadRequest("A valid serial number is required.".to_string()));
    }
    Ok(serial)
}

fn positive_amount(payload: &AmountPayload) -> Result<Decimal, AppError> {
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("Amount must be greater than 0.".to_string()));
    }
    Ok(payload.amount)
}

#[derive(Clone)]
pub struct LifecycleService {
    pool: PgPool,
    client_repo: ClientRepository,
    asset_repo: AssetRepository,
    lifecycle_repo: LifecycleRepository,
    employee_repo: EmployeeRepository,
}

impl LifecycleService {
    pub fn new(
        pool: PgPool,
        client_repo: ClientRepository,
        asset_repo: AssetRepository,
        lifecycle_repo: LifecycleRepository,
        employee_repo: EmployeeRepository,
    ) -> Self {
        Self {
            pool,
            client_repo,
            asset_repo,
            lifecycle_repo,
            employee_repo,
        }
    }

    // =========================================================================
    //  1. CONNECT
    // =========================================================================

    pub async fn connect(
        &self,
        session: &Session,
        client_id: Uuid,
        payload: &ConnectPayload,
    ) -> Result<TransitionOutcome, AppError> {
        let serial = normalized_serial(&payload.serial_number)?;
        let technician_id = session.employee.id;

        let mut tx = self.pool.begin().await?;

        let client = self.client_repo.lock_for_update(&mut *tx, client_id).await?;
        client.status.apply(LifecycleAction::Connect)?;

        let ground_location = clean(payload.ground_location.as_deref()).or(client.ground_location.clone());
        let power_levels = clean(payload.power_levels.as_deref());
        let port_number = clean(payload.port_number.as_deref());
        let router_type = payload.router_type.trim();
        let router_name = payload.router_name.trim();
        let router_password = payload.router_password.trim();

        self.lifecycle_repo
            .insert_connection(
                &mut *tx,
                &NewConnection {
                    client_id,
                    technician_id,
                    serial_number: &serial,
                    power_levels: power_levels.as_deref(),
                    router_name,
                    router_password,
                    ground_location: ground_location.as_deref(),
                    port_number: port_number.as_deref(),
                },
            )
            .await?;

        let asset = self
            .asset_repo
            .insert(
                &mut *tx,
                &NewAsset {
                    asset_name: format!("{} - {}", router_type, client.account_number),
                    asset_type: router_type.to_string(),
                    serial_number: serial,
                    status: LifecycleAction::Connect.asset_status(),
                    assigned_to: technician_id,
                    client_id,
                    location: ground_location.clone(),
                    power_levels,
                    router_name: router_name.to_string(),
                    router_password: router_password.to_string(),
                    port_number,
                },
            )
            .await?;

        let client = self
            .lifecycle_repo
            .mark_connected(&mut *tx, client_id, ground_location.as_deref(), asset.id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🔌 Client {} connected by {} (asset {})",
            client_id,
            session.employee.username,
            asset.id
        );
        Ok(TransitionOutcome {
            client,
            asset: Some(asset),
        })
    }

    // =========================================================================
    //  2. RELOCATE
    // =========================================================================

    pub async fn relocate(
        &self,
        session: &Session,
        client_id: Uuid,
        payload: &RelocatePayload,
    ) -> Result<TransitionOutcome, AppError> {
        let new_serial = normalized_serial(&payload.new_serial_number)?;
        let me = session.employee.id;

        let mut tx = self.pool.begin().await?;

        let client = self.client_repo.lock_for_update(&mut *tx, client_id).await?;
        client.status.apply(LifecycleAction::Relocate)?;

        let assigned_to = match payload.assigned_to {
            None => me,
            Some(id) if id == me => me,
            Some(id) => self
                .employee_repo
                .find_by_id(&mut *tx, id)
                .await?
                .map(|e| e.id)
                .ok_or_else(|| AppError::BadRequest("Assigned employee does not exist.".to_string()))?,
        };

        let latest = self.lifecycle_repo.latest_connection(&mut *tx, client_id).await?;
        let old_location = latest
            .as_ref()
            .and_then(|c| c.ground_location.clone())
            .or(client.ground_location.clone());

        let new_location = payload.new_location.trim();
        let new_port = payload.new_port.trim();
        let new_router = payload.new_router.trim();
        let new_router_password = payload.new_router_password.trim();

        let relocation = NewRelocation {
            client_id,
            old_location: old_location.as_deref(),
            new_location,
            old_port: latest.as_ref().and_then(|c| c.port_number.as_deref()),
            new_port,
            assigned_to,
            old_router: latest.as_ref().and_then(|c| c.router_used.as_deref()),
            new_router,
            old_serial_number: latest.as_ref().map(|c| c.serial_number.as_str()),
            new_serial_number: &new_serial,
            relocated_by: me,
        };

        self.lifecycle_repo.insert_relocation(&mut *tx, &relocation).await?;
        if let Some(connection) = &latest {
            self.lifecycle_repo
                .update_connection_site(&mut *tx, connection.id, &relocation, new_router_password)
                .await?;
        }

        let new_asset = NewAsset {
            asset_name: format!("{} - {}", RELOCATED_ASSET_TYPE, client.account_number),
            asset_type: RELOCATED_ASSET_TYPE.to_string(),
            serial_number: new_serial.clone(),
            status: LifecycleAction::Relocate.asset_status(),
            assigned_to,
            client_id,
            location: Some(new_location.to_string()),
            power_levels: None,
            router_name: new_router.to_string(),
            router_password: new_router_password.to_string(),
            port_number: Some(new_port.to_string()),
        };
        let asset = self.install_relocated_router(&mut *tx, &client, &new_asset).await?;

        let client = self
            .lifecycle_repo
            .mark_relocated(&mut *tx, client_id, new_location, asset.id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "📦 Client {} relocated by {} (router {} assigned to {})",
            client_id,
            session.employee.username,
            new_serial,
            assigned_to
        );
        Ok(TransitionOutcome {
            client,
            asset: Some(asset),
        })
    }

    // Same serial as the current router: the unit moved, so its row is rewritten.
    // A different serial is a new unit and gets its own row.
    async fn install_relocated_router(
        &self,
        conn: &mut PgConnection,
        client: &Client,
        new_asset: &NewAsset,
    ) -> Result<Asset, AppError> {
        if let Some(current_id) = client.current_asset_id {
            let current = self.asset_repo.find_by_id(&mut *conn, current_id).await?;
            let same_unit = current
                .as_ref()
                .is_some_and(|a| a.serial_number.as_deref() == Some(new_asset.serial_number.as_str()));
            if same_unit {
                return self.asset_repo.reinstall(&mut *conn, current_id, new_asset).await;
            }
        }
        self.asset_repo.insert(&mut *conn, new_asset).await
    }

    // =========================================================================
    //  3. RENEW / REVERSE
    // =========================================================================

    pub async fn renew(
        &self,
        session: &Session,
        client_id: Uuid,
        payload: &AmountPayload,
    ) -> Result<TransitionOutcome, AppError> {
        let amount = positive_amount(payload)?;

        let mut tx = self.pool.begin().await?;

        let client = self.client_repo.lock_for_update(&mut *tx, client_id).await?;
        client.status.apply(LifecycleAction::Renew)?;

        self.lifecycle_repo
            .insert_renewal(&mut *tx, client_id, amount, session.employee.id)
            .await?;
        let client = self.lifecycle_repo.mark_renewed(&mut *tx, client_id).await?;
        let asset = self
            .update_current_asset(&mut *tx, &client, LifecycleAction::Renew.asset_status())
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🔁 Client {} renewed by {} ({})",
            client_id,
            session.employee.username,
            amount
        );
        Ok(TransitionOutcome { client, asset })
    }

    pub async fn reverse(
        &self,
        session: &Session,
        client_id: Uuid,
        payload: &AmountPayload,
    ) -> Result<TransitionOutcome, AppError> {
        let amount = positive_amount(payload)?;

        let mut tx = self.pool.begin().await?;

        let client = self.client_repo.lock_for_update(&mut *tx, client_id).await?;
        let next = client.status.apply(LifecycleAction::Reverse)?;

        self.lifecycle_repo
            .insert_reversal(&mut *tx, client_id, amount, session.employee.id)
            .await?;
        let client = self.lifecycle_repo.set_status(&mut *tx, client_id, next).await?;
        let asset = self
            .update_current_asset(&mut *tx, &client, LifecycleAction::Reverse.asset_status())
            .await?;

        tx.commit().await?;

        tracing::info!(
            "↩️ Client {} reversed by {} ({})",
            client_id,
            session.employee.username,
            amount
        );
        Ok(TransitionOutcome { client, asset })
    }

    async fn update_current_asset(
        &self,
        conn: &mut PgConnection,
        client: &Client,
        status: AssetStatus,
    ) -> Result<Option<Asset>, AppError> {
        match client.current_asset_id {
            Some(asset_id) => self.asset_repo.set_status(conn, asset_id, status).await,
            None => Ok(None),
        }
    }

    // =========================================================================
    //  4. CLOSE
    // =========================================================================

    pub async fn close(
        &self,
        session: &Session,
        client_id: Uuid,
        payload: &ClosePayload,
    ) -> Result<TransitionOutcome, AppError> {
        if payload.purchase_price < Decimal::ZERO {
            return Err(AppError::BadRequest("Purchase price cannot be negative.".to_string()));
        }
        let buyer_name = payload.buyer_name.trim();
        if buyer_name.is_empty() {
            return Err(AppError::BadRequest("Buyer name is required.".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let client = self.client_repo.lock_for_update(&mut *tx, client_id).await?;
        let next = client.status.apply(LifecycleAction::Close)?;

        let client = self.lifecycle_repo.set_status(&mut *tx, client_id, next).await?;
        let asset = match client.current_asset_id {
            Some(asset_id) => {
                self.asset_repo
                    .close(&mut *tx, asset_id, payload.purchase_price, buyer_name)
                    .await?
            }
            None => None,
        };

        tx.commit().await?;

        tracing::info!(
            "🔒 Client {} closed by {} (buyer: {})",
            client_id,
            session.employee.username,
            buyer_name
        );
        Ok(TransitionOutcome { client, asset })
    }

    // =========================================================================
    //  5. HISTORY
    // =========================================================================

    pub async fn history(&self, client_id: Uuid) -> Result<ClientHistory, AppError> {
        let client = self
            .client_repo
            .find_by_id(&self.pool, client_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found.".to_string()))?;

        let (connections, relocations, renewals, reversals) = tokio::try_join!(
            self.lifecycle_repo.connections(client_id),
            self.lifecycle_repo.relocations(client_id),
            self.lifecycle_repo.renewals(client_id),
            self.lifecycle_repo.reversals(client_id),
        )?;

        Ok(ClientHistory {
            allowed_actions: client.status.allowed_actions(),
            client,
            connections,
            relocations,
            renewals,
            reversals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Role, fixtures::session};

    fn service() -> LifecycleService {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        LifecycleService::new(
            pool.clone(),
            ClientRepository::new(pool.clone()),
            AssetRepository::new(pool.clone()),
            LifecycleRepository::new(pool.clone()),
            EmployeeRepository::new(pool),
        )
    }

    #[test]
    fn serials_are_normalized_before_use() {
        assert_eq!(normalized_serial("S/N: ab-12").unwrap(), "ab12");
        assert!(matches!(normalized_serial(" sn: -- "), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn amounts_must_be_positive() {
        let ok = AmountPayload { amount: Decimal::new(5000, 0) };
        assert_eq!(positive_amount(&ok).unwrap(), Decimal::new(5000, 0));
        for bad in [Decimal::ZERO, Decimal::new(-1, 0)] {
            assert!(matches!(
                positive_amount(&AmountPayload { amount: bad }),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[tokio::test]
    async fn payload_checks_run_before_any_query() {
        let svc = service();
        let dispatcher = session(Role::Dispatcher, None);
        let id = Uuid::new_v4();

        let renew = svc
            .renew(&dispatcher, id, &AmountPayload { amount: Decimal::ZERO })
            .await;
        assert!(matches!(renew, Err(AppError::BadRequest(_))));

        let close = svc
            .close(
                &dispatcher,
                id,
                &ClosePayload {
                    purchase_price: Decimal::new(-10, 0),
                    buyer_name: "Buyer".into(),
                },
            )
            .await;
        assert!(matches!(close, Err(AppError::BadRequest(_))));

        let close = svc
            .close(
                &dispatcher,
                id,
                &ClosePayload {
                    purchase_price: Decimal::ZERO,
                    buyer_name: "   ".into(),
                },
            )
            .await;
        assert!(matches!(close, Err(AppError::BadRequest(_))));
    }

    // --- Against a live database (skipped without TEST_DATABASE_URL / DATABASE_URL) ---

    use crate::{
        db::test_support::{count_rows, pending_client, session_in, test_db, unique},
        models::client::ClientStatus,
        services::client_service::ClientService,
    };

    fn service_on(pool: &PgPool) -> LifecycleService {
        LifecycleService::new(
            pool.clone(),
            ClientRepository::new(pool.clone()),
            AssetRepository::new(pool.clone()),
            LifecycleRepository::new(pool.clone()),
            EmployeeRepository::new(pool.clone()),
        )
    }

    fn connect_with(serial: &str) -> ConnectPayload {
        ConnectPayload {
            serial_number: serial.to_string(),
            router_type: "ONT".into(),
            router_name: "home-wifi".into(),
            router_password: "pw-1".into(),
            power_levels: Some("-19.5".into()),
            port_number: Some("P3".into()),
            ground_location: None,
        }
    }

    fn relocate_with(serial: &str) -> RelocatePayload {
        RelocatePayload {
            new_location: "Jinja Road".into(),
            new_port: "P7".into(),
            new_router_type: "ONT".into(),
            new_router: "new-wifi".into(),
            new_router_password: "pw-2".into(),
            new_serial_number: serial.to_string(),
            assigned_to: None,
        }
    }

    fn close_with(price: i64, buyer: &str) -> ClosePayload {
        ClosePayload {
            purchase_price: Decimal::new(price, 0),
            buyer_name: buyer.into(),
        }
    }

    #[tokio::test]
    async fn each_action_leaves_exactly_one_record() {
        let Some(db) = test_db().await else { return };
        let pool = &db.pool;
        let svc = service_on(pool);
        let tech = session_in(pool).await;
        let client = pending_client(pool).await;

        let serial = unique("RT");
        let connected = svc.connect(&tech, client.id, &connect_with(&serial)).await.unwrap();
        let asset = connected.asset.unwrap();
        assert_eq!(connected.client.status, ClientStatus::Connected);
        assert_eq!(connected.client.current_asset_id, Some(asset.id));
        assert_eq!(asset.serial_number.as_deref(), Some(serial.as_str()));
        assert_eq!(count_rows(pool, "client_connections", client.id).await, 1);
        assert_eq!(count_rows(pool, "assets", client.id).await, 1);

        let relocated = svc
            .relocate(&tech, client.id, &relocate_with(&unique("RT")))
            .await
            .unwrap();
        assert_eq!(relocated.client.status, ClientStatus::Relocated);
        assert_eq!(relocated.client.relocation_count, connected.client.relocation_count + 1);
        assert_eq!(count_rows(pool, "client_relocations", client.id).await, 1);
        assert_eq!(count_rows(pool, "client_connections", client.id).await, 1);
        assert_eq!(count_rows(pool, "assets", client.id).await, 2);

        let amount = AmountPayload { amount: Decimal::new(50_000, 0) };
        let renewed = svc.renew(&tech, client.id, &amount).await.unwrap();
        assert_eq!(renewed.client.renewal_count, relocated.client.renewal_count + 1);
        assert_eq!(count_rows(pool, "client_renewals", client.id).await, 1);

        let reversed = svc.reverse(&tech, client.id, &amount).await.unwrap();
        assert_eq!(reversed.client.status, ClientStatus::Reversed);
        assert_eq!(count_rows(pool, "client_reversals", client.id).await, 1);

        let history = svc.history(client.id).await.unwrap();
        assert_eq!(history.connections.len(), 1);
        assert_eq!(history.relocations.len(), 1);
        assert_eq!(history.renewals.len(), 1);
        assert_eq!(history.reversals.len(), 1);
        assert_eq!(history.allowed_actions, vec![LifecycleAction::Close]);
    }

    #[tokio::test]
    async fn closing_twice_rewrites_the_sale() {
        let Some(db) = test_db().await else { return };
        let pool = &db.pool;
        let svc = service_on(pool);
        let dispatcher = session_in(pool).await;
        let client = pending_client(pool).await;
        svc.connect(&dispatcher, client.id, &connect_with(&unique("RT")))
            .await
            .unwrap();

        let first = svc
            .close(&dispatcher, client.id, &close_with(100, "First Buyer"))
            .await
            .unwrap();
        assert_eq!(first.client.status, ClientStatus::Closed);

        let second = svc
            .close(&dispatcher, client.id, &close_with(150, "  Second Buyer "))
            .await
            .unwrap();
        assert_eq!(second.client.status, ClientStatus::Closed);
        let asset = second.asset.unwrap();
        assert_eq!(asset.status, LifecycleAction::Close.asset_status());
        assert_eq!(asset.purchase_price, Some(Decimal::new(150, 0)));
        assert_eq!(asset.buyer_name.as_deref(), Some("Second Buyer"));
    }

    #[tokio::test]
    async fn duplicate_serial_rolls_the_connect_back() {
        let Some(db) = test_db().await else { return };
        let pool = &db.pool;
        let svc = service_on(pool);
        let tech = session_in(pool).await;
        let first = pending_client(pool).await;
        let second = pending_client(pool).await;

        let serial = unique("RT");
        svc.connect(&tech, first.id, &connect_with(&serial)).await.unwrap();

        let clash = svc
            .connect(&tech, second.id, &connect_with(&format!("S/N: {serial}")))
            .await;
        assert!(matches!(clash, Err(AppError::SerialNumberInUse)));
        assert_eq!(count_rows(pool, "client_connections", second.id).await, 0);

        let untouched = svc.history(second.id).await.unwrap();
        assert_eq!(untouched.client.status, ClientStatus::Pending);
        assert_eq!(untouched.client.current_asset_id, None);
    }

    #[tokio::test]
    async fn same_serial_relocation_moves_the_router_and_keeps_its_old_site() {
        let Some(db) = test_db().await else { return };
        let pool = &db.pool;
        let svc = service_on(pool);
        let tech = session_in(pool).await;
        let client = pending_client(pool).await;

        let serial = unique("RT");
        let connected = svc.connect(&tech, client.id, &connect_with(&serial)).await.unwrap();
        let original = connected.asset.unwrap();

        let relocated = svc.relocate(&tech, client.id, &relocate_with(&serial)).await.unwrap();
        let moved = relocated.asset.unwrap();
        assert_eq!(moved.id, original.id);
        assert_eq!(moved.location.as_deref(), Some("Jinja Road"));
        assert_eq!(moved.port_number.as_deref(), Some("P7"));
        assert_eq!(count_rows(pool, "assets", client.id).await, 1);

        let history = svc.history(client.id).await.unwrap();
        let relocation = &history.relocations[0];
        assert_eq!(relocation.old_serial_number.as_deref(), Some(serial.as_str()));
        assert_eq!(relocation.new_serial_number.as_deref(), Some(serial.as_str()));
        assert_eq!(relocation.old_location.as_deref(), Some("Kampala Road"));
        assert_eq!(relocation.old_port.as_deref(), Some("P3"));
        assert_eq!(relocation.old_router.as_deref(), Some("home-wifi"));
    }

    #[tokio::test]
    async fn my_clients_lists_only_connected_ones() {
        let Some(db) = test_db().await else { return };
        let pool = &db.pool;
        let svc = service_on(pool);
        let clients = ClientService::new(ClientRepository::new(pool.clone()));
        let tech = session_in(pool).await;
        let client = pending_client(pool).await;

        svc.connect(&tech, client.id, &connect_with(&unique("RT")))
            .await
            .unwrap();
        let mine = clients.list_mine(tech.employee.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].client.id, client.id);

        svc.relocate(&tech, client.id, &relocate_with(&unique("RT")))
            .await
            .unwrap();
        assert!(clients.list_mine(tech.employee.id).await.unwrap().is_empty());
    }
}
