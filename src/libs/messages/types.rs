#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigNotFound,
    ConfigModuleChecker,
    ConfigModulePublisher,
    PromptSelectModules,
    PromptDescriptorUrl,
    PromptCheckInterval,
    PromptTimeout,
    PromptRepo,
    PromptApiUrl,
    PromptDescriptorPath,
    PromptBranch,
    TokenMissing,

    // === CHECK MESSAGES ===
    CheckThrottled(String), // next check time
    UpdateAvailable {
        app_name: String,
        current: String,
        latest: String,
    },
    Changelog(String),
    NoUpdateRequired,
    CheckFailed(String),
    UpgradeHint(String), // app name

    // === INSTALL MESSAGES ===
    ConfirmInstall(String), // version
    UpdateCancelled,
    Downloading(String), // url
    DownloadProgress(u8),
    DownloadVerified(String), // path
    DownloadFailed(String),
    InstallCompleted {
        app_name: String,
        version: String,
    },
    InstallRolledBack(String),
    RepairRequired(String), // backup path
    RestartRequired,

    // === PUBLISH MESSAGES ===
    PublishUsage,
    PublishHashing(String), // artifact path
    PublishReleaseCreated(String), // tag
    PublishAssetUploaded(String),  // url
    PublishDescriptorWritten(String),
    PublishCompleted(String), // version
    PublishFailed(String),

    // === STATUS MESSAGES ===
    StatusHeader,
    StatusNever,
}
