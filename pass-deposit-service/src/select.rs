// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use pass_deposit_model::{DepositStatus, Entity};
use pass_deposit_store::{Filter, PassClient, Selector};

use crate::error::Result;

const PAGE_SIZE: usize = 100;

/// Every record matching `filter`, fetched page by page.
pub(crate) async fn select_all<S: PassClient, T: Entity>(client: &S, filter: Filter) -> Result<Vec<T>> {
    let mut records = Vec::new();
    loop {
        let selector = Selector::new(filter.clone())
            .offset(records.len())
            .limit(PAGE_SIZE);
        let page = client.select_objects::<T>(&selector).await?;
        let fetched = page.items.len();
        records.extend(page.items);
        if fetched == 0 || records.len() >= page.total {
            return Ok(records);
        }
    }
}

pub(crate) fn status_filter(statuses: &[DepositStatus]) -> Filter {
    match statuses {
        [status] => Filter::eq("depositStatus", status),
        _ => Filter::is_in("depositStatus", statuses),
    }
}
