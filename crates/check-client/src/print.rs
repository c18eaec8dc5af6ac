//! Check printing workflow

use crate::api::{BankApi, CheckRequest, IssuedCheck};
use crate::ApiResult;
use check_template::{Bank, Overlay, OverlayEngine, PageGeometry, RenderMode, RenderValues};
use tracing::{info, warn};

/// A recorded check and the overlay to print it with
#[derive(Debug, Clone, PartialEq)]
pub struct PrintJob {
    pub check: IssuedCheck,
    pub overlay: Overlay,
}

/// Records a check, then lays it out for printing
pub struct PrintWorkflow<A> {
    api: A,
    engine: OverlayEngine,
}

impl<A: BankApi> PrintWorkflow<A> {
    pub fn new(api: A, engine: OverlayEngine) -> Self {
        Self { api, engine }
    }

    /// Create the check, then render it once in print mode
    ///
    /// Nothing is rendered when the check cannot be created; the error is
    /// returned as is and no retry is attempted.
    pub async fn finalize(
        &self,
        bank: &Bank,
        request: &CheckRequest,
        page: Option<PageGeometry>,
    ) -> ApiResult<PrintJob> {
        let check = match self.api.create_check(request).await {
            Ok(check) => check,
            Err(e) => {
                warn!(bank_id = %bank.id, error = %e, "check creation failed, not printing");
                return Err(e);
            }
        };

        let values = RenderValues::for_positions(
            &bank.positions,
            &self.engine.config().measure(),
            &check.check.check_values(),
        );
        let overlay = self
            .engine
            .render(&bank.positions, &values, RenderMode::Print, page);

        info!(bank_id = %bank.id, check_id = ?check.id, "check ready to print");
        Ok(PrintJob { check, overlay })
    }
}
