//! `app` 模組是主控台的核心。
//!
//! 它負責管理目前畫面（代理清單、代理表單、聊天）與彈出視窗的狀態，
//! 處理鍵盤輸入，並在每個 tick 把背景輪詢的結果套用到表單上。

/// `actions` 模組：執行按鍵排入的網路動作（載入、儲存、刪除、傳送訊息）。
mod actions;
/// `init` 模組：負責 `App` 結構的初始化。
mod init;
/// `keyboard` 模組：依目前畫面分派鍵盤事件。
mod keyboard;
/// `overlays` 模組：通知、路徑輸入與刪除確認視窗的按鍵處理。
mod overlays;
/// `state` 模組：定義 `App` 以及所有畫面與彈出視窗的狀態類型。
mod state;
/// `tick` 模組：處理定時更新，排空輪詢事件與通知。
mod tick;

pub use state::{
    App, ChatScreen, ConfirmDeleteState, DeleteTarget, FormField, FormScreen, InputPromptState,
    OverlayState, PendingAction, PendingInputAction, Screen, TextInput,
};
