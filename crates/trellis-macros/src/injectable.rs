//! Injectable derive macro implementation.
//!
//! The derive reads each field's type to pick a parameter kind, emits the
//! matching `ParameterSpec` constructor, and builds the struct back from the
//! resolved `Arguments` in field order.

use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, GenericArgument, LitStr, Path, PathArguments,
    PathSegment, Token, Type, TypeParamBound, spanned::Spanned,
};

// ============================================================================
// Attribute structures
// ============================================================================

/// Struct-level `#[injectable(...)]`.
struct StructAttrs {
    name: Option<String>,
    krate: Path,
}

/// Per-field `#[inject(...)]`.
#[derive(Default)]
struct FieldAttrs {
    name: Option<String>,
    service: Option<String>,
    union: Option<Vec<String>>,
    default: Option<Expr>,
    skip: bool,
}

// ============================================================================
// Field classification
// ============================================================================

#[derive(Clone, Copy)]
enum Scalar {
    String,
    Integer,
    Float,
    Bool,
}

/// What a field's type says about its parameter.
enum Shape {
    /// `Arc<T>`
    Service { inner: Type, label: Option<String> },
    /// `Option<Arc<T>>`
    OptionalService { inner: Type, label: Option<String> },
    /// `Option<ServiceArc>`
    Untyped,
    /// A bare scalar.
    Scalar { ty: Type, kind: Scalar },
    /// `Option<scalar>`
    OptionalScalar { ty: Type, kind: Scalar },
}

fn last_segment(ty: &Type) -> Option<&PathSegment> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        Type::Paren(paren) => last_segment(&paren.elem),
        Type::Group(group) => last_segment(&group.elem),
        _ => None,
    }
}

fn single_generic(segment: &PathSegment) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// The name a type is registered under: the last path segment, or the
/// trait name of a trait object.
fn type_label(ty: &Type) -> Option<String> {
    match ty {
        Type::TraitObject(object) => object.bounds.iter().find_map(|bound| match bound {
            TypeParamBound::Trait(tr) => tr.path.segments.last().map(|s| s.ident.to_string()),
            _ => None,
        }),
        Type::Paren(paren) => type_label(&paren.elem),
        Type::Group(group) => type_label(&group.elem),
        _ => last_segment(ty).map(|s| s.ident.to_string()),
    }
}

fn scalar_kind(ty: &Type) -> Option<Scalar> {
    let segment = last_segment(ty)?;
    if !segment.arguments.is_none() {
        return None;
    }
    let kind = match segment.ident.to_string().as_str() {
        "String" => Scalar::String,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => Scalar::Integer,
        "f32" | "f64" => Scalar::Float,
        "bool" => Scalar::Bool,
        _ => return None,
    };
    Some(kind)
}

fn is_ident(ty: &Type, name: &str) -> bool {
    last_segment(ty).is_some_and(|s| s.ident == name)
}

fn classify(ty: &Type) -> syn::Result<Shape> {
    if let Some(kind) = scalar_kind(ty) {
        return Ok(Shape::Scalar {
            ty: ty.clone(),
            kind,
        });
    }

    let segment = last_segment(ty);
    if let Some(segment) = segment
        && segment.ident == "Arc"
        && let Some(inner) = single_generic(segment)
    {
        return Ok(Shape::Service {
            inner: inner.clone(),
            label: type_label(inner),
        });
    }

    if let Some(segment) = segment
        && segment.ident == "Option"
        && let Some(inner) = single_generic(segment)
    {
        if let Some(kind) = scalar_kind(inner) {
            return Ok(Shape::OptionalScalar {
                ty: inner.clone(),
                kind,
            });
        }
        if is_ident(inner, "ServiceArc") {
            return Ok(Shape::Untyped);
        }
        if let Some(arc) = last_segment(inner)
            && arc.ident == "Arc"
            && let Some(service) = single_generic(arc)
        {
            return Ok(Shape::OptionalService {
                inner: service.clone(),
                label: type_label(service),
            });
        }
    }

    Err(syn::Error::new(
        ty.span(),
        "Injectable fields must be `Arc<T>`, `Option<Arc<T>>`, `Option<ServiceArc>`, \
         a scalar, or `Option<scalar>`; use #[inject(skip)] for anything else",
    ))
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_injectable(input: &DeriveInput) -> syn::Result<TokenStream> {
    let attrs = parse_struct_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Injectable cannot be derived for enums",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Injectable cannot be derived for unions",
            ));
        }
    };

    let krate = &attrs.krate;
    let mut specs = Vec::new();
    let mut inits = Vec::new();

    match fields {
        Fields::Named(named) => {
            for field in &named.named {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                let field_attrs = parse_field_attrs(&field.attrs)?;
                if field_attrs.skip {
                    inits.push(quote! { #ident: ::std::default::Default::default() });
                    continue;
                }

                let param = field_attrs
                    .name
                    .clone()
                    .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
                let shape = classify(&field.ty)?;
                let (spec, init) = generate_field(krate, &param, &shape, field_attrs, &field.ty)?;
                specs.push(spec);
                inits.push(quote! { #ident: #init });
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => {
            return Err(syn::Error::new(
                fields.span(),
                "Injectable requires named fields",
            ));
        }
    }

    let name = &input.ident;
    let type_name = attrs.name.unwrap_or_else(|| name.to_string());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let body = match fields {
        Fields::Unit => quote! { Self },
        _ => quote! { Self { #(#inits),* } },
    };
    let arguments_ident = if specs.is_empty() {
        quote! { _arguments }
    } else {
        quote! { arguments }
    };

    Ok(quote! {
        impl #impl_generics #krate::injection::Injectable for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn parameters() -> ::std::vec::Vec<#krate::injection::ParameterSpec> {
                ::std::vec![#(#specs),*]
            }

            fn construct(
                #arguments_ident: #krate::injection::Arguments,
            ) -> #krate::error::InjectionResult<Self> {
                ::std::result::Result::Ok(#body)
            }
        }
    })
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut name = None;
    let mut krate: Path = syn::parse_quote!(::trellis_framework);

    for attr in attrs {
        if !attr.path().is_ident("injectable") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("crate") {
                krate = meta.value()?.parse::<LitStr>()?.parse()?;
            } else {
                return Err(meta.error("unknown #[injectable] key"));
            }
            Ok(())
        })?;
    }

    Ok(StructAttrs { name, krate })
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("inject") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                result.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("service") {
                result.service = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("union") {
                let input = meta.value()?;
                let content;
                syn::bracketed!(content in input);
                let types = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                result.union = Some(types.iter().map(LitStr::value).collect());
            } else if meta.path.is_ident("default") {
                result.default = Some(meta.value()?.parse::<Expr>()?);
            } else if meta.path.is_ident("skip") {
                result.skip = true;
            } else {
                return Err(meta.error("unknown #[inject] key"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

// ============================================================================
// Code generation
// ============================================================================

fn generate_field(
    krate: &Path,
    param: &str,
    shape: &Shape,
    attrs: FieldAttrs,
    field_ty: &Type,
) -> syn::Result<(TokenStream, TokenStream)> {
    let spec_path = quote! { #krate::injection::ParameterSpec };

    if attrs.default.is_some() && !matches!(shape, Shape::Scalar { .. } | Shape::OptionalScalar { .. })
    {
        return Err(syn::Error::new(
            field_ty.span(),
            "#[inject(default = ...)] is only supported on scalar fields",
        ));
    }

    let service_spec = |label: &Option<String>| -> syn::Result<TokenStream> {
        if let Some(types) = &attrs.union {
            return Ok(quote! { #spec_path::union(#param, [#(#types),*]) });
        }
        if let Some(service) = attrs.service.as_ref().or(label.as_ref()) {
            if attrs.service.is_none() && service == "Value" {
                return Ok(quote! { #spec_path::structured(#param) });
            }
            return Ok(quote! { #spec_path::service(#param, #service) });
        }
        Err(syn::Error::new(
            field_ty.span(),
            "cannot infer a service name; add #[inject(service = \"...\")]",
        ))
    };

    let generated = match shape {
        Shape::Service { inner, label } => {
            let spec = service_spec(label)?;
            (
                spec,
                quote! { arguments.service::<#inner>(#param)? },
            )
        }
        Shape::OptionalService { inner, label } => {
            let spec = service_spec(label)?;
            (
                quote! { #spec.with_null_default() },
                quote! { arguments.optional_service::<#inner>(#param)? },
            )
        }
        Shape::Untyped => {
            let spec = match &attrs.union {
                Some(types) => quote! { #spec_path::union(#param, [#(#types),*]) },
                None => quote! { #spec_path::untyped(#param) },
            };
            (spec, quote! { arguments.raw(#param) })
        }
        Shape::OptionalScalar { ty, kind } => {
            let spec = scalar_spec(krate, param, *kind, ty, attrs.default.as_ref());
            (spec, quote! { arguments.scalar::<#ty>(#param)? })
        }
        Shape::Scalar { ty, kind } => {
            let Some(default) = attrs.default.as_ref() else {
                return Err(syn::Error::new(
                    field_ty.span(),
                    "scalar fields need #[inject(default = ...)] or an `Option` type",
                ));
            };
            let spec = scalar_spec(krate, param, *kind, ty, Some(default));
            (
                spec,
                quote! {
                    arguments.scalar::<#ty>(#param)?.ok_or_else(|| {
                        #krate::error::InjectionError::MissingArgument {
                            handler: ::std::string::ToString::to_string(arguments.handler()),
                            parameter: ::std::string::ToString::to_string(#param),
                        }
                    })?
                },
            )
        }
    };
    Ok(generated)
}

fn scalar_spec(
    krate: &Path,
    param: &str,
    kind: Scalar,
    ty: &Type,
    default: Option<&Expr>,
) -> TokenStream {
    let kind_tokens = match kind {
        Scalar::String => quote! { #krate::injection::ScalarKind::String },
        Scalar::Integer => quote! { #krate::injection::ScalarKind::Integer },
        Scalar::Float => quote! { #krate::injection::ScalarKind::Float },
        Scalar::Bool => quote! { #krate::injection::ScalarKind::Bool },
    };
    let spec = quote! { #krate::injection::ParameterSpec::scalar(#param, #kind_tokens) };

    match default {
        None => spec,
        Some(expr) => {
            let value = match kind {
                Scalar::String => quote! {
                    ::std::convert::Into::<::std::string::String>::into(#expr)
                },
                _ => quote! {{
                    let value: #ty = #expr;
                    value
                }},
            };
            quote! { #spec.with_default::<#ty>(#value) }
        }
    }
}
