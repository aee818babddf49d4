use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat};

/// Time a function when the `perf_stats` feature is enabled.
///
/// The body is wrapped with a drop guard that logs `[PERF] name: elapsed`
/// through `tracing::info!` on exit. Compiles to the plain function when the
/// feature is disabled.
///
/// # Features
/// - Auto-detects a `turn: u32` parameter and additionally logs every 100 turns
/// - Logs when the duration exceeds the threshold (default 1ms)
///
/// # Example
/// ```ignore
/// #[profile]
/// pub fn take_turn(&mut self, turn: u32) {
///     // ... work ...
/// }
///
/// #[profile(5)]  // Custom threshold in milliseconds
/// fn build_map(&mut self, target: Cell) { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let has_turn_param = sig.inputs.iter().any(|arg| {
        if let FnArg::Typed(pat_type) = arg {
            if let Pat::Ident(pat_ident) = &*pat_type.pat {
                if pat_ident.ident == "turn" {
                    let ty = &pat_type.ty;
                    return quote!(#ty).to_string() == "u32";
                }
            }
        }
        false
    });

    let profile_guard_def = if has_turn_param {
        quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
                turn: u32,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms || self.turn % 100 == 0 {
                        ::tracing::info!("[PERF] {} (turn {}): {:?}", self.name, self.turn, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
                turn,
            }
        }
    } else {
        quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms {
                        ::tracing::info!("[PERF] {}: {:?}", self.name, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
            }
        }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                #profile_guard_def
            };

            #block
        }
    };

    output.into()
}
