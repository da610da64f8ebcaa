//! Derive and attribute macros for graph-injector
//!
//! - `#[derive(Inject)]` - Generate an `Injectable` impl from field markers
//! - `#[interface]` - Make a trait proxyable through `Proxy<dyn Trait>`
//!
//! # Inject Example
//!
//! ```rust,ignore
//! use graph_injector::{Inject, Resolver, Slot};
//!
//! #[derive(Default, Inject)]
//! struct Database;
//!
//! #[derive(Default, Inject)]
//! struct UserService {
//!     #[inject]
//!     db: Slot<Database>,
//!     // Slots without #[inject] stay empty
//!     audit: Slot<String>,
//!     // Other fields come from Default
//!     request_count: u64,
//! }
//!
//! let service = Resolver::new().resolve::<UserService>().unwrap();
//! ```
//!
//! # Interface Example
//!
//! ```rust,ignore
//! use graph_injector::{Dispatcher, interface};
//! use std::sync::Arc;
//!
//! #[interface]
//! trait Calculator: Send + Sync {
//!     fn add(&self, a: i32, b: i32) -> Result<i32, CalcError>;
//! }
//!
//! let proxy = Dispatcher::logging().create_proxy::<dyn Calculator>(Arc::new(SimpleCalculator));
//! assert_eq!(proxy.add(5, 3)?, 8);
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Fields, FnArg, ItemTrait, Path, ReturnType, TraitItem, Type,
    parse_macro_input,
};

// =============================================================================
// Inject Derive Macro
// =============================================================================

/// Derive macro for the `Injectable` trait.
///
/// Generates `Injectable::descriptor()` for a struct with named fields.
///
/// # Field Attributes
///
/// - `#[inject]` - Mark a `Slot<T>` field for injection. `T` must be `Injectable`.
/// - `#[inject(registered)]` - Mark a `Slot<T>` field whose type has no
///   `Injectable` impl; its descriptor must be registered with the resolver.
///
/// Unmarked `Slot<T>` fields are described but never filled by the resolver.
///
/// # Struct Attributes
///
/// - `#[inject(constructor = path)]` - Build bare instances with
///   `path() -> Result<Self, E>` instead of `Default::default()`.
/// - `#[inject(no_constructor)]` - The type cannot be built by the resolver;
///   resolving it fails with a descriptor error.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Inject)]
/// #[inject(constructor = Connection::open)]
/// struct Connection {
///     #[inject]
///     config: Slot<Config>,
///     socket: std::net::TcpStream,
/// }
/// ```
#[proc_macro_derive(Inject, attributes(inject))]
pub fn derive_inject(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_inject(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_inject(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Only support structs with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Inject can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Inject can only be derived for structs",
            ));
        }
    };

    let construction = match parse_construction(&input.attrs)? {
        Construction::Default => quote! { .default_constructor() },
        Construction::Custom(path) => quote! { .constructor(#path) },
        Construction::None => quote! {},
    };

    let mut points = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let field_label = field_name.to_string();
        let field_type = &field.ty;

        match (find_inject_attr(&field.attrs)?, extract_slot_inner_type(field_type)) {
            (Some(InjectAttr::Required), Some(inner)) => points.push(quote! {
                .inject::<#inner>(#field_label, |this: &Self| &this.#field_name)
            }),
            (Some(InjectAttr::Registered), Some(inner)) => points.push(quote! {
                .inject_registered::<#inner>(#field_label, |this: &Self| &this.#field_name)
            }),
            (None, Some(inner)) => points.push(quote! {
                .slot::<#inner>(#field_label, |this: &Self| &this.#field_name)
            }),
            (Some(_), None) => {
                return Err(syn::Error::new_spanned(
                    field_type,
                    "Fields marked with #[inject] must have type Slot<T>",
                ));
            }
            // Plain field, left to the constructor
            (None, None) => {}
        }
    }

    Ok(quote! {
        impl #impl_generics ::graph_injector::Injectable for #name #ty_generics #where_clause {
            fn descriptor() -> ::graph_injector::TypeDescriptor {
                ::graph_injector::TypeDescriptor::builder::<Self>()
                    #construction
                    #(#points)*
                    .build()
            }
        }
    })
}

/// How bare instances are built
enum Construction {
    Default,
    Custom(Path),
    None,
}

/// Parse struct-level `#[inject(...)]` options
fn parse_construction(attrs: &[Attribute]) -> syn::Result<Construction> {
    let mut construction = Construction::Default;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("constructor") {
                construction = Construction::Custom(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("no_constructor") {
                construction = Construction::None;
                Ok(())
            } else {
                Err(meta.error("expected `constructor = path` or `no_constructor`"))
            }
        })?;
    }

    Ok(construction)
}

/// Types of inject attributes
enum InjectAttr {
    Required,
    Registered,
}

/// Find and parse the #[inject] attribute on a field
fn find_inject_attr(attrs: &[Attribute]) -> syn::Result<Option<InjectAttr>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
        return Ok(None);
    };

    if attr.meta.require_path_only().is_ok() {
        return Ok(Some(InjectAttr::Required));
    }

    let mut kind = InjectAttr::Required;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("registered") {
            kind = InjectAttr::Registered;
            Ok(())
        } else {
            Err(meta.error("expected `registered`"))
        }
    })?;
    Ok(Some(kind))
}

/// Extract T from Slot<T>
fn extract_slot_inner_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Slot" {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first()? {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

// =============================================================================
// Interface Attribute Macro
// =============================================================================

/// Make a trait usable behind `Proxy<dyn Trait>`.
///
/// Keeps the trait unchanged and generates:
///
/// - `impl Interface for dyn Trait`, listing every method with its arity
/// - `impl Trait for Proxy<dyn Trait>`, forwarding every method to the
///   target through the proxy's handler chain
///
/// Every method must take `&self`, have no generic parameters, and return a
/// `Result<T, E>` where `T: Debug` and `E: Error + From<InterceptError>`.
/// Arguments must implement `Debug`; they are snapshotted before the call.
///
/// # Example
///
/// ```rust,ignore
/// #[interface]
/// trait Calculator: Send + Sync {
///     fn divide(&self, a: i32, b: i32) -> Result<f64, CalcError>;
/// }
///
/// // Generated:
/// // impl Interface for dyn Calculator { ... operation("divide", 2) ... }
/// // impl Calculator for Proxy<dyn Calculator> {
/// //     fn divide(&self, __arg0: i32, __arg1: i32) -> Result<f64, CalcError> {
/// //         self.dispatch("divide", Arguments::new(..), move |__target| __target.divide(__arg0, __arg1))
/// //     }
/// // }
/// ```
#[proc_macro_attribute]
pub fn interface(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = TokenStream2::from(attr);
    let item = parse_macro_input!(item as ItemTrait);

    if !attr.is_empty() {
        return syn::Error::new_spanned(attr, "#[interface] takes no arguments")
            .into_compile_error()
            .into();
    }

    expand_interface(&item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_interface(item: &ItemTrait) -> syn::Result<TokenStream2> {
    let name = &item.ident;

    if !item.generics.params.is_empty() || item.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[interface] traits cannot have generic parameters",
        ));
    }

    let mut operations = Vec::new();
    let mut forwards = Vec::new();

    for trait_item in &item.items {
        let TraitItem::Fn(method) = trait_item else {
            return Err(syn::Error::new_spanned(
                trait_item,
                "#[interface] traits may only contain methods",
            ));
        };
        let sig = &method.sig;
        let op = &sig.ident;
        let op_label = op.to_string();

        if !sig.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &sig.generics,
                "interface operations cannot be generic",
            ));
        }
        if let Some(asyncness) = &sig.asyncness {
            return Err(syn::Error::new_spanned(
                asyncness,
                "interface operations cannot be async",
            ));
        }
        if !returns_result(&sig.output) {
            return Err(syn::Error::new_spanned(
                sig,
                "interface operations must return Result<T, E>",
            ));
        }

        let mut inputs = sig.inputs.iter();
        match inputs.next() {
            Some(FnArg::Receiver(receiver))
                if receiver.reference.is_some() && receiver.mutability.is_none() => {}
            _ => {
                return Err(syn::Error::new_spanned(
                    sig,
                    "interface operations must take `&self`",
                ));
            }
        }

        let mut params = Vec::new();
        let mut args = Vec::new();
        for (index, input) in inputs.enumerate() {
            let FnArg::Typed(typed) = input else {
                return Err(syn::Error::new_spanned(input, "unexpected receiver"));
            };
            let arg = format_ident!("__arg{}", index);
            let ty = &typed.ty;
            params.push(quote! { #arg: #ty });
            args.push(arg);
        }

        let arity = args.len();
        operations.push(quote! { .operation(#op_label, #arity) });

        let output = &sig.output;
        let unsafety = &sig.unsafety;
        forwards.push(quote! {
            #unsafety fn #op(&self, #(#params),*) #output {
                let __args = ::graph_injector::Arguments::new(&[
                    #(&#args as &dyn ::std::fmt::Debug),*
                ]);
                self.dispatch(#op_label, __args, move |__target| {
                    #unsafety { __target.#op(#(#args),*) }
                })
            }
        });
    }

    let label = name.to_string();

    Ok(quote! {
        #item

        impl ::graph_injector::Interface for dyn #name {
            fn descriptor() -> ::graph_injector::InterfaceDescriptor {
                ::graph_injector::InterfaceDescriptor::builder(#label)
                    #(#operations)*
                    .build()
            }
        }

        impl #name for ::graph_injector::Proxy<dyn #name> {
            #(#forwards)*
        }
    })
}

/// Check the return type is spelled `Result<..>` (any path ending in `Result`)
fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(type_path) = ty.as_ref() else {
        return false;
    };
    type_path
        .path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "Result")
}
