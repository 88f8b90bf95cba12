//! Platform glue: where the launch URL comes from, where the token lives,
//! and how an exported file reaches the user.
//!
//! | Concern        | Native                         | Browser (wasm32)              |
//! |----------------|--------------------------------|-------------------------------|
//! | Launch URL     | `--url <url>` argument         | `window.location`             |
//! | URL cleanup    | nothing visible to clean       | `history.replaceState`        |
//! | Token storage  | JSON file in the config dir    | `localStorage`                |
//! | Export         | save dialog (rfd)              | Blob + anchor download        |

pub use imp::*;

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use scaffold_core::export::ExportFile;
    use scaffold_core::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
    use scaffold_core::{file_io, CalcResult};

    /// Value following `flag` on the command line
    fn arg_value(flag: &str) -> Option<String> {
        let args: Vec<String> = std::env::args().collect();
        let mut i = 1;
        while i < args.len() {
            if args[i] == flag && i + 1 < args.len() {
                return Some(args[i + 1].clone());
            }
            i += 1;
        }
        None
    }

    pub fn launch_url() -> Option<String> {
        arg_value("--url")
    }

    pub fn api_url_override() -> Option<String> {
        arg_value("--api-url")
    }

    pub fn replace_launch_url(cleaned: &str) {
        tracing::debug!("Launch parameters consumed ({})", cleaned);
    }

    pub fn token_store() -> Box<dyn TokenStore> {
        match FileTokenStore::default_location() {
            Ok(store) => {
                tracing::info!("Token file: {}", store.path().display());
                Box::new(store)
            }
            Err(e) => {
                tracing::warn!("No token file available, token will not persist: {}", e);
                Box::new(MemoryTokenStore::new())
            }
        }
    }

    /// Ask where to save, then write. `Ok(None)` when the dialog is cancelled.
    pub async fn save_export(file: ExportFile) -> CalcResult<Option<String>> {
        let extension = file.filename.rsplit('.').next().unwrap_or_default();

        let handle = rfd::AsyncFileDialog::new()
            .set_title("Сохранить отчет")
            .set_file_name(file.filename)
            .add_filter(extension.to_uppercase(), &[extension])
            .save_file()
            .await;

        let Some(handle) = handle else {
            return Ok(None);
        };

        let path = handle.path().to_path_buf();
        file_io::write_atomic(&path, &file.bytes)?;
        tracing::info!("Report saved to {}", path.display());
        Ok(Some(path.display().to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Storage, Url};

    use scaffold_core::export::ExportFile;
    use scaffold_core::token_store::{TokenStore, TOKEN_STORAGE_KEY};
    use scaffold_core::{CalcError, CalcResult};

    fn js_reason(value: JsValue) -> String {
        value.as_string().unwrap_or_else(|| format!("{:?}", value))
    }

    pub fn launch_url() -> Option<String> {
        web_sys::window()?.location().href().ok()
    }

    /// Browser builds take the API URL from the build environment only
    pub fn api_url_override() -> Option<String> {
        None
    }

    /// Swap the address bar to the cleaned URL without reloading.
    pub fn replace_launch_url(cleaned: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let replaced = window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(cleaned)));
        if let Err(e) = replaced {
            tracing::warn!("Could not clean launch URL: {}", js_reason(e));
        }
    }

    /// Token kept in `localStorage` under [`TOKEN_STORAGE_KEY`]
    pub struct LocalStorageTokenStore {
        storage: Option<Storage>,
    }

    impl LocalStorageTokenStore {
        pub fn new() -> Self {
            let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
            if storage.is_none() {
                tracing::warn!("localStorage unavailable, token will not persist");
            }
            LocalStorageTokenStore { storage }
        }

        fn storage(&self) -> CalcResult<&Storage> {
            self.storage.as_ref().ok_or_else(|| CalcError::file_error(
                "access",
                TOKEN_STORAGE_KEY,
                "localStorage unavailable",
            ))
        }
    }

    impl TokenStore for LocalStorageTokenStore {
        fn load(&self) -> Option<String> {
            let storage = self.storage.as_ref()?;
            storage
                .get_item(TOKEN_STORAGE_KEY)
                .ok()
                .flatten()
                .filter(|token| !token.trim().is_empty())
        }

        fn save(&mut self, token: &str) -> CalcResult<()> {
            self.storage()?
                .set_item(TOKEN_STORAGE_KEY, token)
                .map_err(|e| CalcError::file_error("write", TOKEN_STORAGE_KEY, js_reason(e)))
        }

        fn clear(&mut self) -> CalcResult<()> {
            self.storage()?
                .remove_item(TOKEN_STORAGE_KEY)
                .map_err(|e| CalcError::file_error("remove", TOKEN_STORAGE_KEY, js_reason(e)))
        }
    }

    pub fn token_store() -> Box<dyn TokenStore> {
        Box::new(LocalStorageTokenStore::new())
    }

    /// Trigger a browser download through a temporary object URL.
    pub async fn save_export(file: ExportFile) -> CalcResult<Option<String>> {
        download(&file).map_err(|e| CalcError::export_failed(js_reason(e)))?;
        Ok(Some(file.filename.to_string()))
    }

    fn download(file: &ExportFile) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;

        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(file.bytes.as_slice()));
        let options = BlobPropertyBag::new();
        options.set_type(file.mime_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

        let url = Url::create_object_url_with_blob(&blob)?;
        let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
        anchor.set_href(&url);
        anchor.set_download(file.filename);
        anchor.click();
        Url::revoke_object_url(&url)?;
        Ok(())
    }
}
