//! `form` 模組：代理建立／管理頁面的核心邏輯，與畫面無關。
//!
//! 由下而上：`policy` 驗證、`staging` 暫存檔案、`changes` 變更偵測、
//! `upload` 批次上傳、`poller` 處理狀態輪詢，最後由 `controller` 串起來。

pub mod changes;
pub mod controller;
pub mod notice;
pub mod policy;
pub mod poller;
pub mod staging;
pub mod upload;

pub use changes::FormSnapshot;
pub use controller::{
    ActionButton, FormController, FormError, FormMode, FormOptions, SubmitOutcome,
};
pub use notice::{Notice, NoticeLevel};
pub use policy::{FilePolicy, NameError, validate_agent_name};
pub use poller::{PollEvent, Poller, SessionId};
pub use staging::{AddReport, DisplayStatus, LocalFile, StagedFile, StagingSet};
pub use upload::{UploadBatch, UploadSummary};
