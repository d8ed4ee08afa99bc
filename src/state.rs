use crate::{config::RuntimeConfiguration, data::StudentStore, uploads::UploadSink};
use std::{ops::Deref, sync::Arc};

#[derive(Clone, Debug)]
pub struct StudentsState {
    store: Arc<dyn StudentStore>,
    uploads: UploadSink,
    config: RuntimeConfiguration,
}

impl StudentsState {
    pub fn new(store: Arc<dyn StudentStore>, config: RuntimeConfiguration) -> Self {
        let uploads = UploadSink::new(config.server_config().uploads_dir.clone());

        Self {
            store,
            uploads,
            config,
        }
    }

    pub const fn uploads(&self) -> &UploadSink {
        &self.uploads
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub async fn sensible_shutdown(&self) {
        info!("Closing database pool");
        self.store.close().await;
    }
}

impl Deref for StudentsState {
    type Target = dyn StudentStore;

    fn deref(&self) -> &Self::Target {
        &*self.store
    }
}
