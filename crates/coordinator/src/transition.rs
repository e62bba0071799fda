//! The status coordinator: enacts a merchant-initiated status change
//! across an order group.

use std::collections::HashSet;

use backend::Backend;
use chrono::Utc;
use common::LineItemId;
use domain::{Notification, OrderGroup, OrderStatus};

use crate::config::Config;
use crate::error::CoordinatorError;

/// Applies validated status transitions to order groups.
///
/// A transition is an all-or-nothing batch write over the group's line
/// item ids, followed by an optimistic local update and a best-effort
/// client notification. Concurrent transitions on the same group are
/// last-write-wins; no version check is performed.
pub struct StatusCoordinator<B: Backend> {
    backend: B,
    config: Config,
}

impl<B: Backend> StatusCoordinator<B> {
    /// Creates a coordinator with default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, Config::default())
    }

    /// Creates a coordinator with the given configuration.
    pub fn with_config(backend: B, config: Config) -> Self {
        Self { backend, config }
    }

    /// Advances `group` to `target`.
    ///
    /// On success every constituent line item carries the new status,
    /// and the returned group reflects it immediately, independent of
    /// whether the notification side effect succeeded. On failure no
    /// local state changes; the caller may retry by calling again.
    #[tracing::instrument(
        skip(self, group),
        fields(group_id = %group.group_id, from = %group.status, to = %target)
    )]
    pub async fn transition(
        &self,
        group: &OrderGroup,
        target: OrderStatus,
    ) -> Result<OrderGroup, CoordinatorError> {
        metrics::counter!("status_transitions_total").increment(1);
        let start = std::time::Instant::now();

        if group.line_items.is_empty() {
            return Err(CoordinatorError::EmptyGroup(group.group_id.clone()));
        }
        if !group.status.can_transition_to(target) {
            metrics::counter!("status_transitions_rejected_total").increment(1);
            return Err(CoordinatorError::InvalidTransition {
                from: group.status,
                to: target,
            });
        }

        let ids = group.line_item_ids();
        self.backend.batch_update_status(&ids, target).await?;

        if !self.backend.atomic_batches().await {
            self.verify_applied(group, &ids, target).await?;
        }

        let updated = group.with_status(target, Utc::now());
        tracing::info!(items = ids.len(), "order group status applied");

        if let Err(e) = self.notify(&updated, target).await {
            // The transition is the authoritative fact; the notification
            // is a secondary side effect and never rolls it back.
            metrics::counter!("notifications_failed_total").increment(1);
            tracing::warn!(error = %e, "status notification failed");
        }

        metrics::histogram!("status_transition_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        Ok(updated)
    }

    /// Re-fetches the merchant's rows and checks that every id in the
    /// batch carries the target status.
    async fn verify_applied(
        &self,
        group: &OrderGroup,
        ids: &[LineItemId],
        target: OrderStatus,
    ) -> Result<(), CoordinatorError> {
        let fresh = self.backend.fetch_line_items(group.merchant_id).await?;
        let applied: HashSet<LineItemId> = fresh
            .iter()
            .filter(|item| item.status == target)
            .map(|item| item.id)
            .collect();

        if ids.iter().all(|id| applied.contains(id)) {
            Ok(())
        } else {
            tracing::error!(group_id = %group.group_id, "post-write recheck found stale rows");
            Err(CoordinatorError::PartialApply {
                group_id: group.group_id.clone(),
            })
        }
    }

    async fn notify(&self, group: &OrderGroup, target: OrderStatus) -> backend::Result<()> {
        self.backend
            .create_notification(Notification {
                client_id: group.client_id,
                merchant_id: group.merchant_id,
                title: self.config.notification_title.clone(),
                message: format!(
                    "Votre commande {} est maintenant {}",
                    group.group_id,
                    target.label_fr()
                ),
                created_at: Utc::now(),
                read: false,
            })
            .await
    }
}
