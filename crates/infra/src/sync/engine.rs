use std::sync::Arc;

use tracing::info;

use ledgersync_accounting::SyncEvent;
use ledgersync_core::CompanyId;
use ledgersync_events::{EventDispatcher, EventEnvelope, EventHandler, HandlerId, PublishReport};

use crate::locks::KeyedLocks;
use crate::projections::{
    AccountingLogProjector, CalendarProjector, InstallmentProjector, LedgerProjector,
    MonthlyAggregateMaintainer, StockAlertProjector,
};
use crate::read_model::{
    AccountingLogStore, CalendarStore, InMemoryAccountingLog, InMemoryCalendarStore,
    InMemoryInstallmentStore, InMemoryMonthlyAggregateStore, InMemoryRecordStore,
    InMemoryStockAlertStore, InstallmentStore, MonthlyAggregateStore, RecordStore,
    StockAlertStore,
};

use super::{
    CalendarHandler, FinancialSync, InstallmentPaidHandler, LedgerHandler, StockAlertHandler,
    SyncEnvelope,
};

/// Storage backends the engine projects into.
#[derive(Clone)]
pub struct SyncStores {
    pub records: Arc<dyn RecordStore>,
    pub installments: Arc<dyn InstallmentStore>,
    pub accounting_log: Arc<dyn AccountingLogStore>,
    pub monthly: Arc<dyn MonthlyAggregateStore>,
    pub calendar: Arc<dyn CalendarStore>,
    pub stock_alerts: Arc<dyn StockAlertStore>,
}

impl SyncStores {
    pub fn in_memory() -> Self {
        Self {
            records: Arc::new(InMemoryRecordStore::new()),
            installments: Arc::new(InMemoryInstallmentStore::new()),
            accounting_log: Arc::new(InMemoryAccountingLog::new()),
            monthly: Arc::new(InMemoryMonthlyAggregateStore::new()),
            calendar: Arc::new(InMemoryCalendarStore::new()),
            stock_alerts: Arc::new(InMemoryStockAlertStore::new()),
        }
    }
}

/// Wires the projectors to a dispatcher.
///
/// The dispatcher is passed in, not owned: upstream modules publish through the
/// same instance, and tests can attach extra handlers next to the engine's.
pub struct SyncEngine {
    dispatcher: Arc<EventDispatcher<SyncEnvelope>>,
    stores: SyncStores,
    sync: Arc<FinancialSync>,
    calendar: Arc<CalendarProjector>,
    alerts: Arc<StockAlertProjector>,
    subscriptions: Vec<(&'static str, HandlerId)>,
}

impl SyncEngine {
    pub fn new(dispatcher: Arc<EventDispatcher<SyncEnvelope>>, stores: SyncStores) -> Self {
        let reference_locks = Arc::new(KeyedLocks::new());
        let monthly = Arc::new(MonthlyAggregateMaintainer::new(stores.monthly.clone()));
        let sync = Arc::new(FinancialSync::new(
            LedgerProjector::new(
                stores.records.clone(),
                stores.installments.clone(),
                reference_locks.clone(),
            ),
            InstallmentProjector::new(
                stores.records.clone(),
                stores.installments.clone(),
                reference_locks,
            ),
            AccountingLogProjector::new(stores.accounting_log.clone()),
            monthly,
        ));
        let calendar = Arc::new(CalendarProjector::new(stores.calendar.clone()));
        let alerts = Arc::new(StockAlertProjector::new(stores.stock_alerts.clone()));

        let mut engine = Self {
            dispatcher,
            stores,
            sync: sync.clone(),
            calendar: calendar.clone(),
            alerts: alerts.clone(),
            subscriptions: Vec::new(),
        };

        engine.attach(&LedgerHandler::EVENTS, Arc::new(LedgerHandler::new(sync.clone())));
        engine.attach(
            &InstallmentPaidHandler::EVENTS,
            Arc::new(InstallmentPaidHandler::new(sync)),
        );
        engine.attach(&CalendarHandler::EVENTS, Arc::new(CalendarHandler::new(calendar)));
        engine.attach(
            &[SyncEvent::INVENTORY_BELOW_MINIMUM],
            Arc::new(StockAlertHandler::new(alerts)),
        );

        info!(subscriptions = engine.subscriptions.len(), "sync engine attached");
        engine
    }

    /// Fresh dispatcher and in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(EventDispatcher::new()), SyncStores::in_memory())
    }

    fn attach(&mut self, events: &[&'static str], handler: Arc<dyn EventHandler<SyncEnvelope>>) {
        for event in events {
            let id = self.dispatcher.subscribe(*event, handler.clone());
            self.subscriptions.push((*event, id));
        }
    }

    /// Publish `event` for `company`, stamped with the current time.
    pub fn publish(&self, company: CompanyId, event: SyncEvent) -> PublishReport {
        self.publish_envelope(&EventEnvelope::new(company, event))
    }

    pub fn publish_envelope(&self, envelope: &SyncEnvelope) -> PublishReport {
        self.dispatcher.publish(envelope)
    }

    /// Remove every handler this engine registered. Other subscribers stay.
    pub fn detach(mut self) -> Arc<EventDispatcher<SyncEnvelope>> {
        for (event, id) in self.subscriptions.drain(..) {
            self.dispatcher.unsubscribe(event, id);
        }
        self.dispatcher.clone()
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher<SyncEnvelope>> {
        &self.dispatcher
    }

    pub fn stores(&self) -> &SyncStores {
        &self.stores
    }

    pub fn financial(&self) -> &FinancialSync {
        &self.sync
    }

    pub fn monthly(&self) -> &MonthlyAggregateMaintainer {
        self.sync.monthly()
    }

    pub fn calendar(&self) -> &CalendarProjector {
        &self.calendar
    }

    pub fn stock_alerts(&self) -> &StockAlertProjector {
        &self.alerts
    }
}

impl core::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("dispatcher", &self.dispatcher)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
